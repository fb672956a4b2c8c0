//! Browser shell: wires the core to the DOM, router and yewdux store.
//!
//! # Design
//! - Core objects are built once per mount and shared through `Rc`.
//! - The store only mirrors coordinator and session output.
//! - Every async flow runs on `spawn_local`; no borrow crosses an await.

use crate::core::auth::{Credential, SessionStore};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::FolioConfig;
use crate::core::navigation::{
    DisplayMode, Navigator as SessionNavigator, Route, SessionTransition, is_privileged, recognize,
};
use crate::core::storage::KeyValueStore;
use crate::core::store::{
    LibraryStore, NoticeKind, clear_notice, close_delete_prompt, open_delete_prompt,
    publish_view, select_recent, select_visible, set_admin, set_mode, set_notice,
};
use crate::core::transport::UploadFile;
use crate::features::library::actions::{
    CoordinatorSettings, LibraryAction, MutationCoordinator, success_message,
};
use crate::features::library::logic::view_url;
use crate::features::library::state::ReconciliationEngine;
use crate::models::{CatalogueDetails, Resource, ResourceId};
use crate::services::api::HttpTransport;
use crate::services::storage::SessionStorageStore;
use preferences::{file_size_bytes, load_config};
use std::cell::Cell;
use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;
use yewdux::prelude::{Dispatch, use_selector};

mod logging;
mod preferences;
mod settle;

const RECENT_STRIP_LIMIT: usize = 3;

/// Mount the library shell on the document body.
pub fn run_app() {
    logging::install();
    yew::Renderer::<FolioApp>::new().render();
}

struct Services {
    config: FolioConfig,
    transport: Rc<HttpTransport>,
    session: Rc<SessionStore>,
    navigator: SessionNavigator,
    coordinator: Rc<MutationCoordinator<HttpTransport>>,
    settle_armed: Rc<Cell<bool>>,
}

impl Services {
    fn boot() -> Self {
        let config = load_config();
        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let storage: Rc<dyn KeyValueStore> = Rc::new(SessionStorageStore);
        let transport = Rc::new(HttpTransport::new(config.api_base()));
        let session = Rc::new(SessionStore::new(storage, Rc::clone(&clock)));
        let navigator = SessionNavigator::new(
            Rc::clone(&session),
            config.admin_credential.clone().map(Credential::new),
        );
        let coordinator = Rc::new(MutationCoordinator::new(
            Rc::clone(&transport),
            clock,
            ReconciliationEngine::new(config.baseline_resources()),
            CoordinatorSettings::from_config(&config),
        ));
        Self {
            config,
            transport,
            session,
            navigator,
            coordinator,
            settle_armed: Rc::new(Cell::new(false)),
        }
    }
}

#[function_component(FolioApp)]
fn folio_app() -> Html {
    html! {
        <BrowserRouter>
            <LibraryShell />
        </BrowserRouter>
    }
}

#[function_component(LibraryShell)]
fn library_shell() -> Html {
    let services = use_memo(|_| Services::boot(), ());
    let dispatch = Dispatch::<LibraryStore>::new();
    let visible = use_selector(select_visible);
    let recent = use_selector(|store: &LibraryStore| select_recent(store, RECENT_STRIP_LIMIT));
    let mode = use_selector(|store: &LibraryStore| store.mode);
    let is_admin = use_selector(|store: &LibraryStore| store.is_admin);
    let notice = use_selector(|store: &LibraryStore| store.notice.clone());
    let prompt = use_selector(|store: &LibraryStore| store.delete_prompt.clone());
    let uploading = use_selector(|store: &LibraryStore| store.uploading);
    let path = use_location().map_or_else(|| "/".to_string(), |location| location.path().to_string());

    {
        let services = Rc::clone(&services);
        let dispatch = dispatch.clone();
        use_effect_with_deps(
            move |_| {
                let view_dispatch = dispatch.clone();
                services.coordinator.on_view_change(move |view| {
                    let view = view.to_vec();
                    view_dispatch.reduce_mut(move |store| publish_view(store, &view));
                });
                let admin_dispatch = dispatch.clone();
                let subscription = services.session.subscribe(move |authorized| {
                    admin_dispatch.reduce_mut(move |store| set_admin(store, authorized));
                });
                services.session.restore();
                let authorized = services.session.is_authorized();
                let initial = services.coordinator.view();
                dispatch.reduce_mut(move |store| {
                    set_admin(store, authorized);
                    publish_view(store, &initial);
                });

                let loader = Rc::clone(&services);
                let loader_dispatch = dispatch.clone();
                yew::platform::spawn_local(async move {
                    if let Err(err) = loader.coordinator.refresh().await {
                        let message = err.user_message();
                        loader_dispatch
                            .reduce_mut(move |store| set_notice(store, NoticeKind::Error, message));
                    }
                });

                let session = Rc::clone(&services.session);
                move || {
                    session.unsubscribe(subscription);
                }
            },
            (),
        );
    }

    {
        let services = Rc::clone(&services);
        let dispatch = dispatch.clone();
        use_effect_with_deps(
            move |path: &String| {
                let path = path.clone();
                yew::platform::spawn_local(async move {
                    let outcome = services
                        .navigator
                        .on_navigate(&path, services.transport.as_ref())
                        .await;
                    let rejection = match outcome.session {
                        SessionTransition::Rejected(err) => Some(err.to_string()),
                        SessionTransition::Unchanged
                        | SessionTransition::Acquired
                        | SessionTransition::Revoked => None,
                    };
                    dispatch.reduce_mut(move |store| {
                        set_mode(store, outcome.mode);
                        if let Some(message) = rejection {
                            set_notice(store, NoticeKind::Error, message);
                        }
                    });
                });
                || ()
            },
            path.clone(),
        );
    }

    let on_upload = {
        let services = Rc::clone(&services);
        let dispatch = dispatch.clone();
        Callback::from(move |event: Event| {
            let Some(input) = event.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            input.set_value("");
            let upload = UploadFile {
                name: file.name(),
                mime_type: file.type_(),
                size_bytes: file_size_bytes(file.size()),
                body: file,
            };
            let services = Rc::clone(&services);
            let dispatch = dispatch.clone();
            dispatch.reduce_mut(|store| store.uploading = true);
            yew::platform::spawn_local(async move {
                let session = services.session.current();
                let result = services.coordinator.upload(&upload, session.as_ref()).await;
                let (kind, message) = match &result {
                    Ok(resource) => (
                        NoticeKind::Success,
                        success_message(LibraryAction::Upload, &resource.title),
                    ),
                    Err(err) => (NoticeKind::Error, err.user_message()),
                };
                dispatch.reduce_mut(move |store| {
                    store.uploading = false;
                    set_notice(store, kind, message);
                });
                if result.is_ok() {
                    settle::arm(
                        Rc::clone(&services.coordinator),
                        Rc::clone(&services.settle_armed),
                    );
                }
            });
        })
    };

    let on_delete_request = {
        let dispatch = dispatch.clone();
        Callback::from(move |id: ResourceId| {
            dispatch.reduce_mut(move |store| {
                open_delete_prompt(store, &id);
            });
        })
    };

    let on_delete_cancel = {
        let dispatch = dispatch.clone();
        Callback::from(move |_: MouseEvent| {
            dispatch.reduce_mut(|store| {
                close_delete_prompt(store);
            });
        })
    };

    let on_delete_confirm = {
        let services = Rc::clone(&services);
        let dispatch = dispatch.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(target) = dispatch.get().delete_prompt.clone() else {
                return;
            };
            dispatch.reduce_mut(|store| {
                close_delete_prompt(store);
            });
            let services = Rc::clone(&services);
            let dispatch = dispatch.clone();
            yew::platform::spawn_local(async move {
                let session = services.session.current();
                let result = services
                    .coordinator
                    .remove(&target.id, session.as_ref(), target.origin)
                    .await;
                let (kind, message) = match result {
                    Ok(()) => (
                        NoticeKind::Success,
                        success_message(LibraryAction::Remove, &target.title),
                    ),
                    Err(err) => (NoticeKind::Error, err.user_message()),
                };
                dispatch.reduce_mut(move |store| set_notice(store, kind, message));
            });
        })
    };

    let on_dismiss_notice = {
        let dispatch = dispatch.clone();
        Callback::from(move |_: MouseEvent| dispatch.reduce_mut(clear_notice))
    };

    let api_base = services.config.api_base().to_string();
    let privileged = is_privileged(&path);
    let body = match recognize(&path) {
        Route::About | Route::AdminAbout => about_view(),
        Route::NotFound => html! { <p class="empty">{"Page not found."}</p> },
        Route::Document { id } | Route::AdminDocument { id } => services
            .coordinator
            .find(&ResourceId::from(id))
            .map_or_else(
                || html! { <p class="empty">{"Document not found."}</p> },
                |resource| detail_view(&resource, &api_base),
            ),
        Route::Library | Route::Recent | Route::AdminLibrary | Route::AdminRecent => {
            let cards = CardContext {
                api_base: &api_base,
                is_admin: *is_admin,
                privileged,
                on_delete: &on_delete_request,
            };
            html! {
                <>
                    { if *mode == DisplayMode::Library { recent_strip(&recent, &cards) } else { html! {} } }
                    { grid_view(&visible, *mode, &cards) }
                </>
            }
        }
    };

    let notice_view = (*notice).clone().map_or_else(
        || html! {},
        |notice| {
            let class = match notice.kind {
                NoticeKind::Success => "notice success",
                NoticeKind::Error => "notice error",
            };
            html! {
                <div class={class} role="status">
                    <span>{ notice.message }</span>
                    <button onclick={on_dismiss_notice}>{"Dismiss"}</button>
                </div>
            }
        },
    );

    let upload_view = if *is_admin && *mode != DisplayMode::About {
        let label = if *uploading { "Uploading..." } else { "Upload PDF" };
        html! {
            <label class="upload">
                <span>{ label }</span>
                <input
                    type="file"
                    accept={services.config.upload_mime_type.clone()}
                    disabled={*uploading}
                    onchange={on_upload}
                />
            </label>
        }
    } else {
        html! {}
    };

    let prompt_view = (*prompt).clone().map_or_else(
        || html! {},
        |prompt| {
            html! {
                <div class="modal" role="dialog">
                    <p>{ format!("Delete \"{}\"? This cannot be undone.", prompt.title) }</p>
                    <button class="danger" onclick={on_delete_confirm}>{"Delete"}</button>
                    <button onclick={on_delete_cancel}>{"Cancel"}</button>
                </div>
            }
        },
    );

    html! {
        <div class="folio-shell">
            <header>
                <nav>
                    <Link<Route> to={Route::for_section(DisplayMode::Library, privileged)}>{"Library"}</Link<Route>>
                    <Link<Route> to={Route::for_section(DisplayMode::Recent, privileged)}>{"Recent"}</Link<Route>>
                    <Link<Route> to={Route::for_section(DisplayMode::About, privileged)}>{"About"}</Link<Route>>
                    { if privileged { html! { <Link<Route> to={Route::Library}>{"Exit admin"}</Link<Route>> } } else { html! {} } }
                </nav>
                { if *is_admin { html! { <span class="badge">{"Admin"}</span> } } else { html! {} } }
            </header>
            { notice_view }
            { upload_view }
            <main>{ body }</main>
            { prompt_view }
        </div>
    }
}

struct CardContext<'a> {
    api_base: &'a str,
    is_admin: bool,
    privileged: bool,
    on_delete: &'a Callback<ResourceId>,
}

fn grid_view(resources: &[Resource], mode: DisplayMode, cards: &CardContext<'_>) -> Html {
    if resources.is_empty() {
        let message = match mode {
            DisplayMode::Recent => "No uploads yet.",
            DisplayMode::Library | DisplayMode::About => "The library is empty.",
        };
        return html! { <p class="empty">{ message }</p> };
    }
    html! {
        <ul class="grid">
            { for resources.iter().map(|resource| card_view(resource, cards)) }
        </ul>
    }
}

fn recent_strip(resources: &[Resource], cards: &CardContext<'_>) -> Html {
    if resources.is_empty() {
        return html! {};
    }
    html! {
        <section class="recent-strip">
            <h2>{"Recently added"}</h2>
            <ul>
                { for resources.iter().map(|resource| html! {
                    <li key={resource.id.to_string()}>
                        <Link<Route> to={Route::document(resource.id.to_string(), cards.privileged)}>
                            { resource.title.clone() }
                        </Link<Route>>
                    </li>
                }) }
            </ul>
        </section>
    }
}

fn card_view(resource: &Resource, cards: &CardContext<'_>) -> Html {
    let pending = resource.id.is_local();
    let delete = if cards.is_admin && !pending {
        let id = resource.id.clone();
        let on_delete = cards.on_delete.clone();
        let onclick = Callback::from(move |_: MouseEvent| on_delete.emit(id.clone()));
        html! { <button class="danger" {onclick}>{"Delete"}</button> }
    } else {
        html! {}
    };
    let href = resource
        .source_url
        .clone()
        .unwrap_or_else(|| view_url(cards.api_base, &resource.id));
    html! {
        <li key={resource.id.to_string()} class={classes!("card", pending.then_some("pending"))}>
            <Link<Route> to={Route::document(resource.id.to_string(), cards.privileged)}>
                <h3>{ resource.title.clone() }</h3>
            </Link<Route>>
            <p>{ resource.description.clone() }</p>
            { resource.size_label().map_or_else(|| html! {}, |size| html! { <small>{ size }</small> }) }
            <a href={href} target="_blank" rel="noopener">{"Open"}</a>
            { delete }
        </li>
    }
}

fn detail_view(resource: &Resource, api_base: &str) -> Html {
    let uploaded = resource
        .uploaded_at
        .map(|stamp| stamp.format("%Y-%m-%d %H:%M").to_string());
    html! {
        <article class="detail">
            <h2>{ resource.title.clone() }</h2>
            <p>{ resource.description.clone() }</p>
            { resource.size_label().map_or_else(|| html! {}, |size| html! { <p>{ size }</p> }) }
            { uploaded.map_or_else(|| html! {}, |stamp| html! { <p>{ format!("Uploaded {stamp}") }</p> }) }
            { catalogue_view(&resource.details) }
            <a href={view_url(api_base, &resource.id)} target="_blank" rel="noopener">{"View document"}</a>
        </article>
    }
}

fn catalogue_view(details: &CatalogueDetails) -> Html {
    if details.is_empty() {
        return html! {};
    }
    let rows = [
        ("Author", details.author.clone()),
        ("Pages", details.pages.map(|pages| pages.to_string())),
        ("Category", details.category.clone()),
        ("Published", details.published.clone()),
        ("Language", details.language.clone()),
    ];
    html! {
        <>
            <dl class="catalogue">
                { for rows.into_iter().filter_map(|(label, value)| value.map(|value| html! {
                    <>
                        <dt>{ label }</dt>
                        <dd>{ value }</dd>
                    </>
                })) }
            </dl>
            { details.summary.clone().map_or_else(|| html! {}, |summary| html! { <p class="summary">{ summary }</p> }) }
        </>
    }
}

fn about_view() -> Html {
    html! {
        <article class="about">
            <h2>{"About"}</h2>
            <p>{"A shared library of PDF documents. Admins can upload new documents and remove old ones."}</p>
        </article>
    }
}

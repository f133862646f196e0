use leptos::*;
use vigil_core::{
    Incident, Poller, SessionKind, Stores, DEFAULT_POLL_INTERVAL_MS,
};
use wasm_bindgen_futures::spawn_local;

fn use_stores() -> Stores {
    expect_context::<Stores>()
}

#[component]
pub fn App() -> impl IntoView {
    let stores = use_stores();
    let session = stores.session.session;

    view! {
      <div class="layout">
        <Show
          when=move || session.get().is_some()
          fallback=|| view! { <LoginPanel/> }
        >
          <Dashboard/>
        </Show>
      </div>
    }
}

#[component]
fn LoginPanel() -> impl IntoView {
    let stores = use_stores();
    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let name = create_rw_signal(String::new());
    let registering = create_rw_signal(false);

    let loading = stores.session.loading;
    let error = stores.session.error;

    let submit = {
        let session = stores.session.clone();
        move || {
            let session = session.clone();
            let email = email.get_untracked().trim().to_string();
            let password = password.get_untracked();
            let name = name.get_untracked().trim().to_string();
            let register = registering.get_untracked();
            if email.is_empty() || password.is_empty() {
                return;
            }
            spawn_local(async move {
                if register {
                    session.register(&email, &password, &name).await;
                } else {
                    session.login(&email, &password).await;
                }
            });
        }
    };

    view! {
      <section class="panel login">
        <h2>{move || if registering.get() { "Create account" } else { "Sign in" }}</h2>
        <div class="stack">
          <input
            prop:value=move || email.get()
            on:input=move |ev| email.set(event_target_value(&ev))
            placeholder="Email"
          />
          <input
            type="password"
            prop:value=move || password.get()
            on:input=move |ev| password.set(event_target_value(&ev))
            placeholder="Password"
          />
          <Show when=move || registering.get() fallback=|| ()>
            <input
              prop:value=move || name.get()
              on:input=move |ev| name.set(event_target_value(&ev))
              placeholder="Name"
            />
          </Show>
          <div class="row">
            <button disabled=move || loading.get() on:click=move |_| submit()>
              {move || if loading.get() { "Working..." } else { "Continue" }}
            </button>
            <button class="link" on:click=move |_| registering.update(|r| *r = !*r)>
              {move || if registering.get() { "Have an account? Sign in" } else { "New here? Register" }}
            </button>
          </div>
        </div>
        <Show when=move || error.get().is_some() fallback=|| ()>
          <pre class="error">{move || error.get().unwrap_or_default()}</pre>
        </Show>
      </section>
    }
}

#[component]
fn Dashboard() -> impl IntoView {
    let stores = use_stores();
    let session = stores.session.session;

    // Initial load plus the 30 s refresh loop. The poller handle is dropped
    // on scope teardown; leaking it would leave a timer fetching into an
    // unmounted view.
    {
        if session
            .get_untracked()
            .map(|s| s.is_offline_demo())
            .unwrap_or(false)
        {
            stores
                .app
                .notify("info", "Offline demo session: backend unreachable");
        }

        let incidents = stores.incidents.clone();
        let metrics = stores.metrics.clone();
        let app = stores.app.clone();
        spawn_local(async move {
            incidents.refresh().await;
            let store_id = app.current_store_id.get_untracked();
            metrics.fetch_all(&store_id).await;
            metrics.fetch_dashboard(&store_id).await;
            app.fetch_cameras().await;
        });

        let incidents = stores.incidents.clone();
        let metrics = stores.metrics.clone();
        let app = stores.app.clone();
        let poller = Poller::start(DEFAULT_POLL_INTERVAL_MS, move || {
            let incidents = incidents.clone();
            let metrics = metrics.clone();
            let app = app.clone();
            spawn_local(async move {
                incidents.refresh().await;
                let store_id = app.current_store_id.get_untracked();
                metrics.fetch_all(&store_id).await;
                metrics.fetch_dashboard(&store_id).await;
            });
        });
        on_cleanup(move || drop(poller));
    }

    let logout = {
        let session = stores.session.clone();
        move |_| session.logout()
    };

    let user_label = move || {
        session
            .get()
            .and_then(|s| s.user.map(|u| u.name))
            .unwrap_or_else(|| "Operator".to_string())
    };
    let offline = move || {
        session
            .get()
            .map(|s| s.kind == SessionKind::OfflineDemo)
            .unwrap_or(false)
    };

    let notifications = stores.app.notifications;
    let app_for_feed = stores.app.clone();
    let app_for_clear = stores.app.clone();

    view! {
      <header class="topbar">
        <h1>"Vigil"</h1>
        <div class="row">
          <span>{user_label}</span>
          <Show when=offline fallback=|| ()>
            <span class="badge offline">"offline demo"</span>
          </Show>
          <button on:click=logout>"Sign out"</button>
        </div>
      </header>
      <ul class="notifications">
        <For
          each=move || notifications.get()
          key=|n| n.id
          children=move |n| {
            let app = app_for_feed.clone();
            let id = n.id;
            view! {
              <li>
                <span class="meta">{n.kind.clone()}</span>
                " "
                {n.message.clone()}
                " "
                <button class="link" on:click=move |_| app.dismiss(id)>"dismiss"</button>
              </li>
            }
          }
        />
        {move || (!notifications.get().is_empty()).then(|| {
          let app = app_for_clear.clone();
          view! {
            <li><button class="link" on:click=move |_| app.clear_notifications()>"Clear all"</button></li>
          }
        })}
      </ul>
      <main class="columns">
        <IncidentsPanel/>
        <MetricsPanel/>
      </main>
    }
}

#[component]
fn IncidentsPanel() -> impl IntoView {
    let stores = use_stores();
    let incidents = stores.incidents.clone();
    let error = incidents.error;
    let loading = incidents.loading;

    let refresh = {
        let incidents = incidents.clone();
        move || {
            let incidents = incidents.clone();
            spawn_local(async move {
                incidents.refresh().await;
            });
        }
    };

    let filtered = {
        let incidents = incidents.clone();
        move || incidents.filtered()
    };

    let set_risk = {
        let incidents = incidents.clone();
        move |ev: ev::Event| incidents.set_risk_level(&event_target_value(&ev))
    };
    let set_status = {
        let incidents = incidents.clone();
        move |ev: ev::Event| incidents.set_status(&event_target_value(&ev))
    };
    let set_search = {
        let incidents = incidents.clone();
        move |ev: ev::Event| incidents.set_search(&event_target_value(&ev))
    };

    let selected = incidents.selected;
    let incidents_for_rows = incidents.clone();

    view! {
      <section class="panel">
        <h2>"Incidents"</h2>
        <div class="row">
          <select on:change=set_risk>
            <option value="all">"All risk levels"</option>
            <option value="high">"High"</option>
            <option value="medium">"Medium"</option>
            <option value="low">"Low"</option>
          </select>
          <select on:change=set_status>
            <option value="all">"All statuses"</option>
            <option value="active">"Active"</option>
            <option value="investigating">"Investigating"</option>
            <option value="resolved">"Resolved"</option>
          </select>
          <input
            on:input=set_search
            placeholder="Search descriptions"
          />
          <button disabled=move || loading.get() on:click=move |_| refresh()>"Refresh"</button>
        </div>
        <Show when=move || error.get().is_some() fallback=|| ()>
          <pre class="error">{move || error.get().unwrap_or_default()}</pre>
        </Show>
        <Show when=move || selected.get().is_some() fallback=|| ()>
          <div class="meta">
            {move || selected.get().map(|i| format!("Selected: {}", i.id)).unwrap_or_default()}
          </div>
        </Show>
        <ul>
          <For
            each=filtered
            key=|incident| incident.id.clone()
            children=move |incident| {
              let store = incidents_for_rows.clone();
              view! { <IncidentRow incident=incident store=store/> }
            }
          />
        </ul>
      </section>
    }
}

#[component]
fn IncidentRow(incident: Incident, store: vigil_core::IncidentStore) -> impl IntoView {
    let id = incident.id.clone();

    let select = {
        let store = store.clone();
        let incident = incident.clone();
        move |_| store.select(Some(incident.clone()))
    };

    let confirm = {
        let store = store.clone();
        let id = id.clone();
        move |decision: bool| {
            let store = store.clone();
            let id = id.clone();
            spawn_local(async move {
                store.confirm(&id, decision).await;
            });
        }
    };

    let decision_buttons = incident.user_confirmed.is_none().then(|| {
        let confirm_yes = confirm.clone();
        let confirm_no = confirm;
        view! {
          <button on:click=move |_| confirm_yes(true)>"Confirm"</button>
          <button on:click=move |_| confirm_no(false)>"Dismiss"</button>
        }
    });

    let resolve_button = (incident.status != vigil_core::IncidentStatus::Resolved).then(|| {
        let store = store.clone();
        let id = id.clone();
        view! {
          <button on:click=move |_| {
            let store = store.clone();
            let id = id.clone();
            spawn_local(async move {
                store
                    .update(
                        &id,
                        &vigil_core::IncidentPatch {
                            status: Some(vigil_core::IncidentStatus::Resolved),
                            ..vigil_core::IncidentPatch::default()
                        },
                    )
                    .await;
            });
          }>"Resolve"</button>
        }
    });

    let remove = {
        let store = store.clone();
        let id = id.clone();
        move |_| {
            let store = store.clone();
            let id = id.clone();
            spawn_local(async move {
                store.remove(&id).await;
            });
        }
    };

    view! {
      <li class="incident" on:click=select>
        <div>
          <b>{incident.id.clone()}</b>
          " "
          <span class=format!("badge {}", incident.severity.as_str())>
            {incident.severity.as_str()}
          </span>
          " "
          <span class="meta">{format!("({})", incident.status.as_str())}</span>
        </div>
        <div>{incident.description.clone()}</div>
        <div class="meta">{format!("{} · {}", incident.zone, incident.timestamp)}</div>
        <div class="row">
          {decision_buttons}
          {resolve_button}
          <button class="danger" on:click=remove>"Delete"</button>
        </div>
      </li>
    }
}

#[component]
fn MetricsPanel() -> impl IntoView {
    let stores = use_stores();
    let metrics = stores.metrics.clone();
    let app = stores.app.clone();
    let error = metrics.error;

    let summary = metrics.dashboard;
    let roi = metrics.roi;
    let heatmap = metrics.heatmap;
    let patterns = metrics.patterns;
    let cameras = app.cameras;

    view! {
      <section class="panel">
        <h2>"Analytics"</h2>
        <Show when=move || error.get().is_some() fallback=|| ()>
          <pre class="error">{move || error.get().unwrap_or_default()}</pre>
        </Show>

        <h3>"Last 24h"</h3>
        <div class="tiles">
          {move || summary.get().map(|s| view! {
            <>
              <div class="tile">
                <span class="meta">"Incidents"</span>
                <b>{s.total_incidents_24h}</b>
              </div>
              <div class="tile">
                <span class="meta">"Detections"</span>
                <b>{s.total_detections_24h}</b>
              </div>
              <div class="tile">
                <span class="meta">"Cameras online"</span>
                <b>{format!("{}/{}", s.active_cameras, s.total_cameras)}</b>
              </div>
            </>
          })}
        </div>

        <h3>"ROI"</h3>
        {move || roi.get().map(|r| view! {
          <div class="meta">
            {format!(
              "{:.0}% over {} days · {:.0} prevented vs {:.0} invested",
              r.roi_percent, r.period_days, r.prevented_loss, r.security_investment
            )}
          </div>
        })}

        <h3>"Hot zones"</h3>
        <ul>
          <For
            each=move || heatmap.get().map(|h| h.zones).unwrap_or_default()
            key=|zone| zone.id.clone()
            children=|zone| view! {
              <li>
                <b>{zone.name.clone()}</b>
                <span class="meta">{format!(" {} detections ({})", zone.detections, zone.risk_level)}</span>
              </li>
            }
          />
        </ul>

        <h3>"Risk patterns"</h3>
        <ul>
          <For
            each=move || patterns.get().map(|p| p.patterns).unwrap_or_default()
            key=|pattern| pattern.name.clone()
            children=|pattern| view! {
              <li>
                <b>{pattern.name.clone()}</b>
                <span class="meta">{format!(" ×{} peak {}", pattern.occurrences, pattern.peak_hour)}</span>
              </li>
            }
          />
        </ul>

        <h3>"Cameras"</h3>
        <ul>
          <For
            each=move || cameras.get()
            key=|camera| camera.id.clone()
            children=|camera| view! {
              <li>
                <b>{camera.id.clone()}</b>
                <span class="meta">{format!(" {} · {}", camera.location, camera.status)}</span>
              </li>
            }
          />
        </ul>
      </section>
    }
}

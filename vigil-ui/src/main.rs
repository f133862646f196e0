#[cfg(target_arch = "wasm32")]
fn main() {
    use leptos::{mount_to_body, provide_context, view};
    use vigil_core::Stores;
    use vigil_ui::app::App;

    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("init logger");

    mount_to_body(|| {
        let stores = Stores::new_browser();
        stores.session.restore();
        provide_context(stores);
        view! { <App/> }
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("vigil-ui targets wasm32-unknown-unknown; build it with trunk");
}

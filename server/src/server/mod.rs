mod host_settings;
pub use host_settings::EntityHostSettings;

mod host_service;
pub use host_service::HostService;

cfg_if! {
    if #[cfg(feature = "tokio_timer")] {
        mod update_loop;
        pub use update_loop::spawn_update_loop;
    }
}

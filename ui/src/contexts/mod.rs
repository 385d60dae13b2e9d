pub mod loading_registry;
pub mod toast;

pub use loading_registry::{
    LoadingProvider, use_loading_count, use_loading_registry,
};
pub use toast::{ToastHandle, ToastProvider, use_toast};

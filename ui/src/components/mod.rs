pub mod loading_overlay;
pub mod toast;

pub use loading_overlay::LoadingOverlay;
pub use toast::ToastContainer;

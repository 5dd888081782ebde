use std::future::Future;
use std::pin::Pin;

/// Future returned by port methods. Collaborators live on the UI task, so
/// nothing here is required to be `Send`.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

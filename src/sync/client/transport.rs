use crate::{error::BoxedError, pool::Egress};
use futures::future::{BoxFuture, FutureExt};
use url::Url;

/// Status code and body of one upstream response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Performs a single GET through the given egress.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, egress: &'a Egress, url: &'a Url) -> BoxFuture<'a, Result<RawResponse, BoxedError>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;
impl Transport for HttpTransport {
    fn get<'a>(&'a self, egress: &'a Egress, url: &'a Url) -> BoxFuture<'a, Result<RawResponse, BoxedError>> {
        async move {
            let response = egress.client.get(url.clone()).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, BoxedError>(RawResponse { status, body })
        }
        .boxed()
    }
}

/// Fileserver hit counter
///
/// Wraps the `/app` static file scope and counts every request that goes
/// through it. The count is shared with the admin routes through
/// `web::Data<FileserverHits>`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counter. Cloning gives another handle to the same count.
#[derive(Debug, Clone, Default)]
pub struct FileserverHits {
    count: Arc<AtomicU64>,
}

impl FileserverHits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

impl<S, B> Transform<S, ServiceRequest> for FileserverHits
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = FileserverHitsService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(FileserverHitsService {
            service: Rc::new(service),
            hits: self.clone(),
        }))
    }
}

pub struct FileserverHitsService<S> {
    service: Rc<S>,
    hits: FileserverHits,
}

impl<S, B> Service<ServiceRequest> for FileserverHitsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // counted before the file lookup, so misses count too
        self.hits.increment();

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

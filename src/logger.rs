//! Access log for the whole app.
//!
//! One line per request through the `log` facade, which
//! `telemetry::init_telemetry` bridges into `tracing`. Headers are never
//! logged, so `Authorization` credentials stay out of the access log.

use std::rc::Rc;
use std::time::Instant;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};

/// `METHOD /path?query`, without the `?` when there is no query string.
pub(crate) fn request_line(method: &str, path: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{} {}", method, path)
    } else {
        format!("{} {}?{}", method, path, query)
    }
}

fn log_completed(line: &str, status: StatusCode, elapsed_ms: u128) {
    if status.is_server_error() {
        warn!("{} -> {} ({}ms)", line, status.as_u16(), elapsed_ms);
    } else {
        info!("{} -> {} ({}ms)", line, status.as_u16(), elapsed_ms);
    }
}

pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequestLoggerService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
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
        let started = Instant::now();
        let line = request_line(req.method().as_str(), req.path(), req.query_string());
        let service = self.service.clone();

        Box::pin(async move {
            match service.call(req).await {
                Ok(res) => {
                    log_completed(&line, res.status(), started.elapsed().as_millis());
                    Ok(res)
                }
                Err(e) => {
                    let status = e.as_response_error().status_code();
                    log_completed(&line, status, started.elapsed().as_millis());
                    Err(e)
                }
            }
        })
    }
}

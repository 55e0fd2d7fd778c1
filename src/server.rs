//! HTTP request dispatch.
//!
//! A handful of routes, matched by hand on `(Method, path)` rather than
//! pulled in through a router crate — there are few enough endpoints that a
//! `match` is clearer than a macro-generated dispatch table. Every handler
//! returns `Result<T, ApiError>`; [`json_response`]/[`error_response`] are
//! the only places that turn that into a `hyper` body and status code, so
//! the handlers in [`crate::api`] never touch `hyper` types directly.

use std::convert::Infallible;
use std::net::{SocketAddr, TcpListener};

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use log::{error, info};
use serde::Serialize;

use crate::api::types::{
    ChunkCheckReq, ChunkRegisterReq, ErrorResp, FileCommitReq, HealthResp, StorageHeartbeatReq,
};
use crate::api::{chunk, debug, file, heartbeat, AppState};
use crate::error::ApiError;

/// Bind the configured address and serve forever (until the process is
/// signalled to stop).
pub async fn run(state: AppState) -> Result<(), anyhow::Error> {
    let addr: SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr)?;
    serve(listener, state).await
}

/// Serve on an already-bound listener. Split out from [`run`] so tests can
/// bind `127.0.0.1:0`, read back the OS-assigned port, and drive the
/// service over real loopback HTTP instead of calling handlers in-process.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), anyhow::Error> {
    listener.set_nonblocking(true)?;
    let local_addr = listener.local_addr()?;

    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(dispatch(state, req).await) }
            }))
        }
    });

    info!("dfs-metad listening on {}", local_addr);
    Server::from_tcp(listener)?.serve(make_svc).await?;
    Ok(())
}

async fn dispatch(state: AppState, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = route(&state, method.clone(), &path, req).await;
    match result {
        Ok(response) => response,
        Err(err) => {
            error!("{} {} -> {}: {}", method, path, err.status(), err);
            error_response(&err)
        }
    }
}

async fn route(
    state: &AppState,
    method: Method,
    path: &str,
    req: Request<Body>,
) -> Result<Response<Body>, ApiError> {
    match (&method, path) {
        (&Method::GET, "/health") => {
            json_response(StatusCode::OK, &HealthResp { role: "meta", ok: true })
        }
        (&Method::POST, "/chunk/check") => {
            let body: ChunkCheckReq = read_json(req).await?;
            let resp = chunk::chunk_check(state, body).await?;
            json_response(StatusCode::OK, &resp)
        }
        (&Method::POST, "/chunk/register") => {
            let body: ChunkRegisterReq = read_json(req).await?;
            let resp = chunk::chunk_register(state, body).await?;
            json_response(StatusCode::OK, &resp)
        }
        (&Method::POST, "/file/commit") => {
            let body: FileCommitReq = read_json(req).await?;
            let resp = file::file_commit(state, body).await?;
            json_response(StatusCode::OK, &resp)
        }
        (&Method::GET, path) if path.starts_with("/file/") => {
            let name = path.trim_start_matches("/file/");
            let resp = file::file_get(state, name).await?;
            json_response(StatusCode::OK, &resp)
        }
        (&Method::POST, "/internal/storage_heartbeat") => {
            let body: StorageHeartbeatReq = read_json(req).await?;
            let resp = heartbeat::storage_heartbeat(state, body).await?;
            json_response(StatusCode::OK, &resp)
        }
        (&Method::GET, "/debug/leader") => {
            let resp = debug::debug_leader(state).await?;
            json_response(StatusCode::OK, &resp)
        }
        (&Method::GET, "/debug/membership") => {
            let resp = debug::debug_membership(state).await?;
            json_response(StatusCode::OK, &resp)
        }
        _ => Err(ApiError::NotFound(format!("no such route: {} {}", method, path))),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(req: Request<Body>) -> Result<T, ApiError> {
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|err| ApiError::Validation(format!("unable to read request body: {}", err)))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("request body must not be empty".to_string()));
    }
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::Validation(format!("malformed request body: {}", err)))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Body>, ApiError> {
    let payload = serde_json::to_vec(body)
        .map_err(|err| ApiError::Corruption(format!("unable to serialize response: {}", err)))?;
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(payload))
        .expect("response built from static parts"))
}

fn error_response(err: &ApiError) -> Response<Body> {
    let body = ErrorResp { detail: err.detail() };
    let payload = serde_json::to_vec(&body).unwrap_or_else(|_| b"{\"detail\":\"error\"}".to_vec());
    Response::builder()
        .status(err.status())
        .header("content-type", "application/json")
        .body(Body::from(payload))
        .expect("response built from static parts")
}

//! Request dispatch.
//!
//! Deliberately not an HTTP parser: requests are routed by prefix matching on
//! the raw buffer, and the body of `POST /run` is scanned for a `cmd` field.
//!
//! | Prefix      | Result                                  |
//! |-------------|-----------------------------------------|
//! | `GET / `    | menu form page                          |
//! | `POST /run` | decode `cmd`, execute, `<pre>` output   |
//! | otherwise   | 404                                     |

use http::StatusCode;

use crate::exec::{ExecError, Executor};
use crate::http::form;
use crate::http::pages;
use crate::http::request::header_end;
use crate::http::response::Response;
use crate::menu::Menu;
use crate::net::ConnectionContext;
use crate::observability::metrics;

/// Route label used for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Menu,
    Run,
    NotFound,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Menu => "menu",
            Route::Run => "run",
            Route::NotFound => "not_found",
        }
    }
}

/// Routes raw requests to the menu page or the command executor.
#[derive(Debug)]
pub struct Dispatcher {
    executor: Executor,
    menu: Menu,
}

impl Dispatcher {
    pub fn new(executor: Executor, menu: Menu) -> Self {
        Self { executor, menu }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Classify a raw request by its prefix.
    pub fn route(raw: &[u8]) -> Route {
        if raw.starts_with(b"GET / ") {
            Route::Menu
        } else if raw.starts_with(b"POST /run") {
            Route::Run
        } else {
            Route::NotFound
        }
    }

    /// Produce the response for one raw request.
    pub async fn dispatch(&self, raw: &[u8], ctx: &ConnectionContext) -> (Route, Response) {
        let route = Self::route(raw);
        let response = match route {
            Route::Menu => Response::html(StatusCode::OK, pages::menu_page(&self.menu)),
            Route::Run => self.run(raw, ctx).await,
            Route::NotFound => Response::text(StatusCode::NOT_FOUND, "Not found\n"),
        };
        (route, response.with_request_id(ctx.request_id.clone()))
    }

    async fn run(&self, raw: &[u8], ctx: &ConnectionContext) -> Response {
        let Some(end) = header_end(raw) else {
            tracing::debug!(connection_id = %ctx.id, "POST without header terminator");
            return Response::text(StatusCode::BAD_REQUEST, "Malformed request\n");
        };

        let body = &raw[end + 4..];
        let Some(field) = form::form_field(body, "cmd") else {
            tracing::debug!(connection_id = %ctx.id, "POST without cmd field");
            return Response::text(StatusCode::BAD_REQUEST, "Missing cmd field\n");
        };

        let command = String::from_utf8_lossy(&form::decode(field)).into_owned();

        tracing::info!(
            connection_id = %ctx.id,
            request_id = %ctx.request_id,
            peer = %ctx.peer,
            command = %command,
            "Executing command"
        );

        match self.executor.execute(&command).await {
            Ok(output) => {
                tracing::info!(
                    connection_id = %ctx.id,
                    exit_status = ?output.status,
                    bytes = output.len(),
                    timed_out = output.timed_out,
                    truncated = output.truncated,
                    "Command finished"
                );

                let page = pages::output_page(&output);
                if output.timed_out {
                    metrics::record_execution("timeout");
                    Response::html(StatusCode::GATEWAY_TIMEOUT, page)
                } else {
                    let success = output.status.is_some_and(|s| s.success());
                    metrics::record_execution(if success { "success" } else { "failure" });
                    Response::html(StatusCode::OK, page)
                }
            }
            Err(ExecError::EmptyCommand) => {
                metrics::record_execution("empty");
                Response::text(StatusCode::BAD_REQUEST, "Empty command\n")
            }
            Err(e) => {
                tracing::error!(connection_id = %ctx.id, error = %e, "Command could not be executed");
                metrics::record_execution("spawn_error");
                Response::text(StatusCode::INTERNAL_SERVER_ERROR, "Error executing command.\n")
            }
        }
    }
}

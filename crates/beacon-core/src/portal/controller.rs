use core::fmt::Write as _;

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embedded_io_async::{Read, Write};
use heapless::String;

use super::{
    pages::{self, Branding},
    routes::{self, AdminRoute, Route},
};
use crate::{
    config::{AdminPrefix, ConfigError, ProfileConfig, ProfileName, SSID_SIZE, SystemConfig},
    defaults::files,
    net::http::{
        ContentHeaders,
        ContentType,
        Error as HttpError,
        HttpConnection,
        HttpHandler,
        HttpMethod,
        HttpResult,
        ResponseHeaders,
        TextEncoding,
        form::{self, FormError},
    },
    restart::{RestartError, RestartReason, RestartScheduler},
    storage::{ConfigStore, FileSystem, StorageError},
};

/// Largest rendered page
pub const PAGE_SIZE: usize = 4096;
const ASSET_CHUNK_SIZE: usize = 512;
/// Longest single form value
const FIELD_SIZE: usize = 256;

/// Configuration the device is running with.
///
/// Saved changes only take effect after the restart, so this never changes
/// while the portal is serving.
#[derive(Debug, Clone)]
pub struct PortalContext {
    pub system: SystemConfig,
    pub profile: ProfileConfig,
    pub network_name: String<SSID_SIZE>,
    pub version: &'static str,
}

/// Reason a submitted form was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionError {
    pub field: &'static str,
    pub kind: SubmissionErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionErrorKind {
    Form(FormError),
    Invalid(ConfigError),
}

/// Build the configuration to save from a form body.
///
/// `prefix` is required. A missing `profile` keeps the running profile name;
/// other missing fields take their defaults, an absent `hidden` checkbox
/// meaning not hidden.
pub fn parse_submission(
    body: &str,
    current: &SystemConfig,
) -> Result<(SystemConfig, ProfileConfig), SubmissionError> {
    let prefix = required(body, "prefix")?;
    let admin_prefix = AdminPrefix::parse(&prefix).map_err(invalid("prefix"))?;

    let active_profile = match optional(body, "profile")? {
        Some(name) => ProfileName::parse(&name).map_err(invalid("profile"))?,
        None => current.active_profile.clone(),
    };

    let mut profile = ProfileConfig::named(active_profile.clone());
    for (field, key) in [
        ("ssid", ProfileConfig::KEY_SSID),
        ("channel", ProfileConfig::KEY_CHANNEL),
        ("hidden", ProfileConfig::KEY_HIDDEN),
        ("title", ProfileConfig::KEY_TITLE),
        ("message", ProfileConfig::KEY_MESSAGE),
    ] {
        if let Some(value) = optional(body, field)? {
            profile.set(key, &value).map_err(invalid(field))?;
        }
    }

    Ok((
        SystemConfig {
            active_profile,
            admin_prefix,
        },
        profile,
    ))
}

fn optional(body: &str, field: &'static str) -> Result<Option<String<FIELD_SIZE>>, SubmissionError> {
    form::field(body, field).map_err(|e| SubmissionError {
        field,
        kind: SubmissionErrorKind::Form(e),
    })
}

fn required(body: &str, field: &'static str) -> Result<String<FIELD_SIZE>, SubmissionError> {
    optional(body, field)?.ok_or(SubmissionError {
        field,
        kind: SubmissionErrorKind::Invalid(ConfigError::Empty),
    })
}

fn invalid(field: &'static str) -> impl Fn(ConfigError) -> SubmissionError {
    move |e| SubmissionError {
        field,
        kind: SubmissionErrorKind::Invalid(e),
    }
}

/// Serves the captive landing page and the administration routes.
pub struct AdminController<'a, M: RawMutex, F: FileSystem> {
    store: &'a Mutex<M, ConfigStore<F>>,
    restart: &'a RestartScheduler<M>,
    context: &'a PortalContext,
}

impl<'a, M: RawMutex, F: FileSystem> AdminController<'a, M, F> {
    pub const fn new(
        store: &'a Mutex<M, ConfigStore<F>>,
        restart: &'a RestartScheduler<M>,
        context: &'a PortalContext,
    ) -> Self {
        Self {
            store,
            restart,
            context,
        }
    }

    fn branding(&self) -> Branding<'_> {
        Branding {
            admin_prefix: self.context.system.admin_prefix.as_str(),
            version: self.context.version,
        }
    }

    async fn save<S: Read + Write>(&self, conn: &mut HttpConnection<S>) -> HttpResult {
        let submission = match conn.read_body().await {
            Ok(body) => core::str::from_utf8(body)
                .map_err(|_| "The form is not valid UTF-8.")
                .map(|body| parse_submission(body, &self.context.system)),
            Err(e) if e.is_bad_request() => Err("The form is missing or too large."),
            Err(e) => return Err(e),
        };
        let (system, profile) = match submission {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                log::warn!("admin: rejected {} ({:?})", e.field, e.kind);
                let mut detail = String::<64>::new();
                let _ = write!(detail, "Invalid value for '{}'.", e.field);
                return self.reject(conn, &detail).await;
            }
            Err(detail) => return self.reject(conn, detail).await,
        };

        let mut store = self.store.lock().await;
        if self.restart.is_pending() {
            drop(store);
            return self.conflict(conn).await;
        }
        // Switching to a stored profile keeps its fields
        let saved = match self.switched_profile(&mut store, &system).await {
            Ok(Some(stored)) => store.save(&system, &stored).await,
            Ok(None) => store.save(&system, &profile).await,
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            drop(store);
            log::error!("admin: saving configuration failed: {:?}", e);
            return self
                .error_page(
                    conn,
                    ResponseHeaders::internal_error(),
                    "Save failed",
                    "The configuration could not be stored. Nothing was changed.",
                )
                .await;
        }
        if let Err(e) = self.restart.schedule(RestartReason::ConfigurationSaved) {
            log::warn!("admin: restart not scheduled: {:?}", e);
        }
        drop(store);

        self.page(conn, ResponseHeaders::success(), |out, branding| {
            pages::saved(out, branding, &system)
        })
        .await
    }

    async fn switched_profile(
        &self,
        store: &mut ConfigStore<F>,
        system: &SystemConfig,
    ) -> Result<Option<ProfileConfig>, StorageError> {
        if system.active_profile == self.context.system.active_profile {
            return Ok(None);
        }
        let stored = store.stored_profile(&system.active_profile).await?;
        if stored.is_some() {
            log::info!(
                "admin: switching to stored profile '{}'",
                system.active_profile.as_str()
            );
        }
        Ok(stored)
    }

    async fn reset<S: Read + Write>(&self, conn: &mut HttpConnection<S>) -> HttpResult {
        let scheduled = {
            let _store = self.store.lock().await;
            self.restart.schedule(RestartReason::Requested)
        };
        match scheduled {
            Ok(()) => {
                self.page(conn, ResponseHeaders::success(), |out, branding| {
                    pages::restarting(out, branding)
                })
                .await
            }
            Err(RestartError::AlreadyPending) => self.conflict(conn).await,
        }
    }

    async fn serve_stylesheet<S: Read + Write>(
        &self,
        conn: &mut HttpConnection<S>,
        method: HttpMethod,
    ) -> HttpResult {
        let size = self.store.lock().await.asset_size(files::ADMIN_CSS).await;
        let size = match size {
            Ok(size) => size,
            Err(StorageError::NotFound) => return self.not_found(conn, method).await,
            Err(e) => {
                log::error!("admin: stylesheet unavailable: {:?}", e);
                return self
                    .error_page(
                        conn,
                        ResponseHeaders::internal_error(),
                        "Error",
                        "The stylesheet could not be read.",
                    )
                    .await;
            }
        };

        let headers =
            ResponseHeaders::success().with_content(ContentHeaders::new(ContentType::TextCss, size));
        conn.write_headers(&headers).await?;
        if method == HttpMethod::Head {
            return conn.flush().await;
        }

        let mut chunk = [0u8; ASSET_CHUNK_SIZE];
        let mut offset = 0;
        while offset < size {
            let read = self
                .store
                .lock()
                .await
                .read_asset(files::ADMIN_CSS, offset, &mut chunk)
                .await;
            let n = match read {
                Ok(n) if n > 0 => n.min(size - offset),
                other => {
                    log::error!("admin: stylesheet read stopped at {}: {:?}", offset, other);
                    return Err(HttpError::Closed);
                }
            };
            conn.write_body(&chunk[..n]).await?;
            offset += n;
        }
        conn.flush().await
    }

    async fn reject<S: Read + Write>(&self, conn: &mut HttpConnection<S>, detail: &str) -> HttpResult {
        self.error_page(conn, ResponseHeaders::bad_request(), "Invalid input", detail)
            .await
    }

    async fn conflict<S: Read + Write>(&self, conn: &mut HttpConnection<S>) -> HttpResult {
        self.error_page(
            conn,
            ResponseHeaders::conflict(),
            "Restart pending",
            "A restart is already pending. Try again once the device is back.",
        )
        .await
    }

    async fn not_found<S: Read + Write>(&self, conn: &mut HttpConnection<S>, method: HttpMethod) -> HttpResult {
        let headers = ResponseHeaders::not_found();
        self.page_for(conn, method, headers, |out, branding| pages::not_found(out, branding))
            .await
    }

    async fn error_page<S: Read + Write>(
        &self,
        conn: &mut HttpConnection<S>,
        headers: ResponseHeaders,
        title: &str,
        detail: &str,
    ) -> HttpResult {
        self.page(conn, headers, |out, branding| pages::error(out, branding, title, detail))
            .await
    }

    async fn page<S: Read + Write>(
        &self,
        conn: &mut HttpConnection<S>,
        headers: ResponseHeaders,
        render: impl FnOnce(&mut String<PAGE_SIZE>, &Branding<'_>) -> core::fmt::Result,
    ) -> HttpResult {
        self.page_for(conn, HttpMethod::Get, headers, render).await
    }

    /// Render a page and send it; `HEAD` gets the headers only.
    async fn page_for<S: Read + Write>(
        &self,
        conn: &mut HttpConnection<S>,
        method: HttpMethod,
        headers: ResponseHeaders,
        render: impl FnOnce(&mut String<PAGE_SIZE>, &Branding<'_>) -> core::fmt::Result,
    ) -> HttpResult {
        let mut page = String::<PAGE_SIZE>::new();
        render(&mut page, &self.branding())?;
        let content = ContentHeaders::for_body(ContentType::TextHtml, page.as_bytes())
            .with_text_encoding(TextEncoding::Utf8);
        let body: &[u8] = if method == HttpMethod::Head {
            &[]
        } else {
            page.as_bytes()
        };
        conn.write_response(&headers.with_content(content), body).await
    }
}

impl<M: RawMutex, F: FileSystem> HttpHandler for AdminController<'_, M, F> {
    async fn handle_request<S: Read + Write>(&self, conn: &mut HttpConnection<S>) -> HttpResult {
        let (method, path) = conn.route();
        let context = self.context;
        match routes::resolve(&context.system.admin_prefix, path) {
            Route::Landing => {
                self.page_for(conn, method, ResponseHeaders::success(), |out, branding| {
                    pages::landing(out, branding, &context.profile)
                })
                .await
            }
            Route::Admin(AdminRoute::Home) => {
                self.page_for(conn, method, ResponseHeaders::success(), |out, branding| {
                    pages::admin_home(
                        out,
                        branding,
                        &context.system,
                        &context.profile,
                        &context.network_name,
                    )
                })
                .await
            }
            Route::Admin(AdminRoute::Save) => {
                if method == HttpMethod::Post {
                    self.save(conn).await
                } else {
                    self.error_page(
                        conn,
                        ResponseHeaders::method_not_allowed(HttpMethod::Post),
                        "Method Not Allowed",
                        "Settings are saved through the administration form.",
                    )
                    .await
                }
            }
            Route::Admin(AdminRoute::Reset) => self.reset(conn).await,
            Route::Admin(AdminRoute::Stylesheet) => match method {
                HttpMethod::Get | HttpMethod::Head => self.serve_stylesheet(conn, method).await,
                _ => {
                    self.error_page(
                        conn,
                        ResponseHeaders::method_not_allowed(HttpMethod::Get),
                        "Method Not Allowed",
                        "The stylesheet can only be fetched.",
                    )
                    .await
                }
            },
            Route::Admin(AdminRoute::NotFound) => self.not_found(conn, method).await,
        }
    }
}

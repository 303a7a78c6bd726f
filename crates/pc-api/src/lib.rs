//! HR attendance API client.
//!
//! Wraps the endpoints the dashboard needs:
//! - Account login (bearer token and employee profile)
//! - Clock-in details for one attendance date
//! - Upcoming holidays

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use pc_core::{PunchEvent, PunchKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BASE_URL: &str = "https://app.mewurk.com/api/v1";
const LOGIN_PATH: &str = "userservice/account/login";
const CLOCK_IN_DETAILS_PATH: &str = "attendanceservice/attendancelogs/clockindetails";
const UPCOMING_EVENTS_PATH: &str = "leaveservice/dashboard/upcoming/events";

/// HR API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL is unusable.
    #[error("invalid base URL: {reason}")]
    InvalidBaseUrl { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The token was missing, expired or revoked.
    #[error("not authorized: session expired or invalid")]
    Unauthorized,
    /// Non-success HTTP status without a readable message.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The service answered but reported failure.
    #[error("rejected by server: {message}")]
    Rejected { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Login credentials as typed by the user.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub company_code: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("company_code", &self.company_code)
            .finish()
    }
}

impl Credentials {
    /// Username as the service expects it: base64 of `username|company_code`.
    pub fn encoded_username(&self) -> String {
        STANDARD.encode(format!("{}|{}", self.username, self.company_code))
    }
}

/// An authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub employee_code: String,
    pub employee_name: String,
    pub email: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("employee_code", &self.employee_code)
            .field("employee_name", &self.employee_name)
            .field("email", &self.email)
            .finish()
    }
}

/// One punch as reported by the attendance service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockInDetail {
    pub in_out_type: PunchKind,
    pub clock_time: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub office_name: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
}

impl PunchEvent for ClockInDetail {
    fn kind(&self) -> PunchKind {
        self.in_out_type
    }

    fn clock_time(&self) -> &str {
        &self.clock_time
    }
}

/// Attendance record for one date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockDetails {
    pub attendance_date: String,
    #[serde(default)]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub shift_name: Option<String>,
    #[serde(default)]
    pub shift_start_time: Option<String>,
    #[serde(default)]
    pub shift_end_time: Option<String>,
    #[serde(default)]
    pub clock_in_details: Vec<ClockInDetail>,
}

/// An upcoming public or optional holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayDetail {
    pub day: String,
    pub month: String,
    pub holiday_name: String,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub state_name: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvents {
    #[serde(default)]
    pub holiday_details: Vec<HolidayDetail>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: String,
    password: &'a str,
    otp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClockInDetailsRequest<'a> {
    employee_code: &'a str,
    clock_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    token: String,
    user_model: UserModel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserModel {
    employee_code: String,
    #[serde(default)]
    employee_name: String,
    #[serde(default)]
    email: String,
}

/// Common response wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    is_success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

/// HR API client.
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client for the given API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not http(s), or if the
    /// HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(ApiError::InvalidBaseUrl {
                reason: "base URL cannot be empty",
            });
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidBaseUrl {
                reason: "base URL must start with http:// or https://",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Logs in and returns the session to use for later calls.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        tracing::debug!(username = %credentials.username, "logging in");
        let request = LoginRequest {
            username: credentials.encoded_username(),
            password: &credentials.password,
            otp: None,
        };

        let data: LoginData = self
            .send(self.http.post(self.endpoint(LOGIN_PATH)).json(&request))
            .await?;

        Ok(AuthSession {
            token: data.token,
            employee_code: data.user_model.employee_code,
            employee_name: data.user_model.employee_name,
            email: data.user_model.email,
        })
    }

    /// Fetches the raw punches recorded for `date`.
    pub async fn clock_in_details(
        &self,
        session: &AuthSession,
        date: NaiveDate,
    ) -> Result<ClockDetails, ApiError> {
        tracing::debug!(employee = %session.employee_code, %date, "fetching clock-in details");
        let request = ClockInDetailsRequest {
            employee_code: &session.employee_code,
            clock_date: date.format("%Y-%m-%d").to_string(),
        };

        self.send(
            self.http
                .post(self.endpoint(CLOCK_IN_DETAILS_PATH))
                .bearer_auth(&session.token)
                .json(&request),
        )
        .await
    }

    /// Fetches upcoming holidays visible to the employee.
    pub async fn upcoming_events(&self, session: &AuthSession) -> Result<UpcomingEvents, ApiError> {
        tracing::debug!(employee = %session.employee_code, "fetching upcoming events");
        self.send(
            self.http
                .get(self.endpoint(UPCOMING_EVENTS_PATH))
                .bearer_auth(&session.token),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "received response");
        decode_response(status.as_u16(), &body)
    }
}

/// Unwraps the response envelope into the endpoint's payload.
fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if status == 401 {
        return Err(ApiError::Unauthorized);
    }
    if !(200..300).contains(&status) {
        return Err(parse_api_error(body).unwrap_or_else(|| ApiError::Http {
            status,
            body: body.to_string(),
        }));
    }

    let envelope: Envelope =
        serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
    if !envelope.is_success {
        return Err(ApiError::Rejected {
            message: non_empty_message(envelope.message)
                .unwrap_or_else(|| "request was not successful".to_string()),
        });
    }
    if envelope.data.is_null() {
        return Err(ApiError::InvalidResponse("missing data".to_string()));
    }

    serde_json::from_value(envelope.data).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

fn parse_api_error(body: &str) -> Option<ApiError> {
    let envelope: Envelope = serde_json::from_str(body).ok()?;
    non_empty_message(envelope.message).map(|message| ApiError::Rejected { message })
}

fn non_empty_message(message: Option<String>) -> Option<String> {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

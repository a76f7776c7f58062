use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use actix_web::web;
use actix_web::HttpMessage;
use actix_web::{HttpRequest, dev::ServiceRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use strum::{AsRefStr, Display, EnumString};
use crate::error::{ApiError, ApiResult};

// ======== STAFF ROLE ========

/// Role of an authenticated staff member. Each role keeps its accounts in
/// its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StaffRole {
    Admin,
    Hod,
    LabIncharge,
    LabAssistant,
}

impl StaffRole {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    pub const fn table(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admins",
            StaffRole::Hod => "hods",
            StaffRole::LabIncharge => "lab_incharges",
            StaffRole::LabAssistant => "lab_assistants",
        }
    }

    /// Column of `lab_staff` that names an account of this role, if any
    pub const fn assignment_email_column(&self) -> Option<&'static str> {
        match self {
            StaffRole::LabIncharge => Some("incharge_email"),
            StaffRole::LabAssistant => Some("assistant_email"),
            StaffRole::Admin | StaffRole::Hod => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StaffRole::Admin => "Administrator",
            StaffRole::Hod => "Head of Department",
            StaffRole::LabIncharge => "Lab In-charge",
            StaffRole::LabAssistant => "Lab Assistant",
        }
    }

    // ======== LAB PERMISSIONS ========
    pub fn can_provision_labs(&self) -> bool {
        matches!(self, StaffRole::Admin)
    }

    // ======== REQUEST PERMISSIONS ========
    pub fn can_report_problems(&self) -> bool {
        matches!(self, StaffRole::LabIncharge | StaffRole::LabAssistant)
    }

    pub fn can_progress_requests(&self) -> bool {
        matches!(self, StaffRole::Admin | StaffRole::Hod | StaffRole::LabIncharge)
    }

    pub fn can_review_requests(&self) -> bool {
        matches!(self, StaffRole::Admin)
    }

    // ======== DEAD STOCK PERMISSIONS ========
    pub fn can_decide_deadstock(&self) -> bool {
        matches!(self, StaffRole::Admin)
    }

    // ======== SYSTEM PERMISSIONS ========
    pub fn can_manage_staff(&self) -> bool {
        matches!(self, StaffRole::Admin)
    }

    pub fn all_roles() -> [Self; 4] {
        [StaffRole::Admin, StaffRole::Hod, StaffRole::LabIncharge, StaffRole::LabAssistant]
    }
}

// ======== CLAIMS ========

/// Claims of a token minted by the external credential service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // staff id within the role table
    pub name: String,
    pub role: StaffRole,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn staff_id(&self) -> ApiResult<i64> {
        self.sub
            .parse::<i64>()
            .map_err(|_| ApiError::Unauthorized("Malformed token subject".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }
}

// ======== AUTH SERVICE ========

pub struct AuthService {
    decoding_key: DecodingKey,
    #[cfg(test)]
    encoding_key: jsonwebtoken::EncodingKey,
}

impl AuthService {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            #[cfg(test)]
            encoding_key: jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }

    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                match err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature =>
                        ApiError::Unauthorized("Token expired".to_string()),
                    jsonwebtoken::errors::ErrorKind::InvalidToken =>
                        ApiError::Unauthorized("Invalid token".to_string()),
                    _ =>
                        ApiError::Unauthorized("Token verification failed".to_string()),
                }
            })
    }

    /// Mints a token the way the credential service does; tests only.
    #[cfg(test)]
    pub fn issue_token(&self, staff_id: i64, role: StaffRole) -> String {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: staff_id.to_string(),
            name: format!("{} {}", role.display_name(), staff_id),
            role,
            exp: (now + chrono::Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
            .expect("token encoding")
    }
}

// ======== HELPER FUNCTIONS ========

pub fn get_current_user(req: &HttpRequest) -> ApiResult<Claims> {
    req.extensions()
        .get::<Claims>().cloned()
        .ok_or_else(|| ApiError::Unauthorized("No user information found".to_string()))
}

pub fn check_permission<F>(claims: &Claims, check: F) -> ApiResult<()>
where
    F: Fn(&StaffRole) -> bool,
{
    if check(&claims.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Insufficient permissions".to_string()))
    }
}

pub fn require_permission(req: &HttpRequest, permission_check: fn(&StaffRole) -> bool) -> ApiResult<Claims> {
    let claims = get_current_user(req)?;
    check_permission(&claims, permission_check)?;
    Ok(claims)
}

/// Staff-scoped paths may only be used by the staff member they name.
/// Admins may act on behalf of anyone.
pub fn ensure_acting_as(claims: &Claims, role: StaffRole, staff_id: i64) -> ApiResult<()> {
    if claims.is_admin() {
        return Ok(());
    }
    if claims.role == role && claims.staff_id()? == staff_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Path identity does not match the authenticated staff member".to_string()))
    }
}

// ======== JWT MIDDLEWARE ========

pub async fn jwt_middleware(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (actix_web::Error, ServiceRequest)> {
    let token = credentials.token();

    let auth_service = match req.app_data::<web::Data<std::sync::Arc<AuthService>>>() {
        Some(svc) => svc,
        None => {
            log::error!("AuthService not found in app data");
            return Err((
                ApiError::InternalServerError("Auth service not available".to_string()).into(),
                req,
            ));
        }
    };

    match auth_service.verify_token(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(err) => {
            log::warn!("JWT verification failed: {}", err);
            Err((err.into(), req))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SECRET: &str = "test_secret_key_with_32_characters!!";

    #[test]
    fn test_role_parsing_and_tables() {
        assert_eq!(StaffRole::from_str("lab_assistant").unwrap(), StaffRole::LabAssistant);
        assert_eq!(StaffRole::from_str("HOD").unwrap(), StaffRole::Hod);
        assert!(StaffRole::from_str("student").is_err());

        assert_eq!(StaffRole::LabIncharge.as_str(), "lab_incharge");
        assert_eq!(StaffRole::LabIncharge.table(), "lab_incharges");
        assert_eq!(StaffRole::LabAssistant.assignment_email_column(), Some("assistant_email"));
        assert_eq!(StaffRole::Hod.assignment_email_column(), None);
    }

    #[test]
    fn test_role_serde_matches_strum() {
        for role in StaffRole::all_roles() {
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, role.to_string());
        }
    }

    #[test]
    fn test_token_round_trip() {
        let service = AuthService::new(SECRET);
        let token = service.issue_token(7, StaffRole::LabIncharge);
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.staff_id().unwrap(), 7);
        assert_eq!(claims.role, StaffRole::LabIncharge);
    }

    #[test]
    fn test_token_with_other_secret_is_rejected() {
        let token = AuthService::new(SECRET).issue_token(1, StaffRole::Admin);
        let other = AuthService::new("another_secret_key_with_32_characters");
        assert!(matches!(other.verify_token(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_acting_as() {
        let service = AuthService::new(SECRET);
        let assistant = service.verify_token(&service.issue_token(3, StaffRole::LabAssistant)).unwrap();
        let admin = service.verify_token(&service.issue_token(1, StaffRole::Admin)).unwrap();

        assert!(ensure_acting_as(&assistant, StaffRole::LabAssistant, 3).is_ok());
        assert!(matches!(
            ensure_acting_as(&assistant, StaffRole::LabAssistant, 4),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_acting_as(&assistant, StaffRole::LabIncharge, 3),
            Err(ApiError::Forbidden(_))
        ));
        assert!(ensure_acting_as(&admin, StaffRole::LabAssistant, 99).is_ok());
    }

    #[test]
    fn test_permissions() {
        assert!(StaffRole::Admin.can_provision_labs());
        assert!(!StaffRole::Hod.can_provision_labs());
        assert!(StaffRole::LabAssistant.can_report_problems());
        assert!(!StaffRole::Admin.can_report_problems());
        assert!(StaffRole::LabIncharge.can_progress_requests());
        assert!(!StaffRole::LabAssistant.can_progress_requests());
    }
}

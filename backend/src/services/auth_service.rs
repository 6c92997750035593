use tracing::{info, instrument, warn};

use crate::{
    authentication::auth::{
        create_refresh_token, create_token, hash_password, verify_password, verify_refresh_token,
    },
    create_profile_request::CreateProfileRequest,
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    login_request::LoginRequest,
    login_response::{LoginResponse, SignedInUser},
    profile::Profile,
    role::Role,
    settings::Settings,
    signup_request::SignupRequest,
    token_response::TokenResponse,
    user::User,
    user_get_response::UserGetResponse,
};

const MIN_PASSWORD_LENGTH: usize = 6;

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    ApiError::Internal(e.to_string())
}

pub struct AuthService<'a> {
    data: &'a DataContext,
    settings: &'a Settings,
}

impl<'a> AuthService<'a> {
    pub fn new(data: &'a DataContext, settings: &'a Settings) -> Self {
        Self { data, settings }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub fn signup(&self, request: SignupRequest) -> ApiResult<UserGetResponse> {
        let email = request.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::bad_request("A valid email is required"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::bad_request(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        if request.role == Role::SuperAdmin {
            return Err(ApiError::forbidden("Cannot sign up as super admin"));
        }

        let password_hash = hash_password(&request.password).map_err(internal)?;
        let user = User::new(&email, password_hash, request.role);
        if !self.data.create_user(&user)? {
            return Err(ApiError::bad_request("User already exists"));
        }
        info!(user_id = %user.id, role = %user.role, "user signed up");
        Ok(user.to_get_dto(String::new()))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        let user = self
            .data
            .get_user_by_email(&request.email)?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        if !verify_password(&request.password, &user.password_hash) {
            warn!(user_id = %user.id, "failed login attempt");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
        if user.is_blocked {
            return Err(ApiError::forbidden("Your account has been blocked"));
        }
        if !user.is_active {
            return Err(ApiError::forbidden("Your account has been suspended"));
        }

        let access_token = create_token(&user, self.settings).map_err(internal)?;
        let refresh_token = create_refresh_token(&user, self.settings).map_err(internal)?;
        let name = self.data.display_name(user.id)?;
        info!(user_id = %user.id, "user logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: SignedInUser {
                id: user.id,
                email: user.email,
                role: user.role,
                name,
            },
        })
    }

    /// Issues a new access token. Role and account state are re-read from storage.
    pub fn refresh_token(&self, refresh_token: &str) -> ApiResult<TokenResponse> {
        let claims = verify_refresh_token(refresh_token, self.settings)
            .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;
        let user = self
            .data
            .get::<User>(claims.sub)?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;
        if !user.can_sign_in() {
            return Err(ApiError::forbidden("Your account is not active"));
        }
        Ok(TokenResponse {
            access_token: create_token(&user, self.settings).map_err(internal)?,
        })
    }

    /// Seeds the configured super admin on an empty database.
    pub fn ensure_default_admin(&self) -> ApiResult<()> {
        if self.data.count_users()? > 0 {
            return Ok(());
        }
        let password_hash =
            hash_password(&self.settings.default_admin_password).map_err(internal)?;
        let admin = User::new(&self.settings.default_admin_email, password_hash, Role::SuperAdmin);
        if !self.data.create_user(&admin)? {
            return Ok(());
        }
        let profile = Profile::new(
            admin.id,
            CreateProfileRequest {
                name: "Super Admin".into(),
                image_url: None,
                phone_number: None,
                skill: Vec::new(),
                bio: None,
                address: None,
            },
        );
        self.data.create_profile(&profile)?;
        info!(email = %admin.email, "default super admin created");
        Ok(())
    }
}

use crate::api::ad::{ActiveAdQuery, CreateAd, UpdateAd};
use crate::api::article::{
    ArticleListResponse, ArticleQuery, CreateArticle, Pagination, UpdateArticle,
};
use crate::api::category::{CreateCategory, UpdateCategory};
use crate::api::payroll::GeneratePayrollReq;
use crate::api::salary_component::{CreateComponent, UpdateComponent};
use crate::api::settings::UpdateSetting;
use crate::api::user::{CreateUser, UpdateUser, UserListResponse, UserQuery};
use crate::model::ad::Ad;
use crate::model::article::{Article, ArticleListItem};
use crate::model::category::Category;
use crate::model::payroll::Payroll;
use crate::model::salary_component::{ComponentKind, SalaryComponent};
use crate::model::user::User;
use crate::models::LoginReqDto;
use crate::payroll::scheduler::{CreatedSlip, FailedAuthor, RunOutcome, SkippedAuthor};
use crate::payroll::Period;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{openapi, Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LangsaPost API",
        version = "1.0.0",
        description = r#"
## LangsaPost Regional News Portal

Backend for the public news site and its admin back office.

### 🔹 Key Features
- **Articles & Categories**
  - Public listing, search and detail pages; authenticated authoring
- **Users & Roles**
  - Admin-managed accounts with admin / editor / writer roles
- **Advertising**
  - Ad slots per page position with scheduling windows
- **Payroll**
  - Monthly payslip generation per author, with PDF download

### 🔐 Security
Write endpoints are protected with **JWT Bearer authentication**.
Payroll generation and user management require the **admin** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::article::list_articles,
        crate::api::article::get_article,
        crate::api::article::create_article,
        crate::api::article::update_article,
        crate::api::article::delete_article,

        crate::api::category::list_categories,
        crate::api::category::create_category,
        crate::api::category::update_category,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::deactivate_user,

        crate::api::ad::list_active_ads,
        crate::api::ad::list_ads,
        crate::api::ad::create_ad,
        crate::api::ad::update_ad,
        crate::api::ad::delete_ad,

        crate::api::settings::get_settings,
        crate::api::settings::update_setting,

        crate::api::salary_component::list_components,
        crate::api::salary_component::create_component,
        crate::api::salary_component::update_component,

        crate::api::payroll::generate_payroll,
        crate::api::payroll::payroll_status,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::download_payroll
    ),
    components(
        schemas(
            LoginReqDto,
            Article,
            ArticleListItem,
            ArticleQuery,
            ArticleListResponse,
            Pagination,
            CreateArticle,
            UpdateArticle,
            Category,
            CreateCategory,
            UpdateCategory,
            User,
            UserQuery,
            UserListResponse,
            CreateUser,
            UpdateUser,
            Ad,
            ActiveAdQuery,
            CreateAd,
            UpdateAd,
            UpdateSetting,
            SalaryComponent,
            ComponentKind,
            CreateComponent,
            UpdateComponent,
            Payroll,
            Period,
            GeneratePayrollReq,
            RunOutcome,
            CreatedSlip,
            SkippedAuthor,
            FailedAuthor
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Articles", description = "Public news content and authoring APIs"),
        (name = "Categories", description = "Category management APIs"),
        (name = "Users", description = "User and role management APIs"),
        (name = "Ads", description = "Advertising slot APIs"),
        (name = "Settings", description = "Site settings APIs"),
        (name = "Payroll", description = "Monthly payroll generation and payslip APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(openapi::Components::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

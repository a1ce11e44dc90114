use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::leave_balance::{BalanceQuery, BalanceResponse};
use crate::api::leave_request::{
    CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse, RejectLeave, UpdateLeave,
};
use crate::api::leave_type::CreateLeaveType;
use crate::leave::status::LeaveStatus;
use crate::model::employee::Employee;
use crate::model::leave_type::LeaveType;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LeaveDesk API",
        version = "1.0.0",
        description = r#"
## Leave Management Backend

This API powers the leave-management slice of an HR system: leave types,
leave requests, and per-year leave balances.

### Key Features
- **Leave Requests**
  - Apply for leave, approve/reject/cancel, edit dates or status
- **Leave Balances**
  - Allocated / carried-forward / used / pending day buckets per
    (employee, leave type, year); `available` is always derived
- **Leave Types**
  - Reference data with annual allotments and approval rules
- **Employee Management**
  - Create, update, list, and view employee profiles

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Only **Admin** or **HR** roles can approve, reject, or edit requests.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::leave_balance::get_balance,

        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::list_leave_types,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            CreateLeave,
            UpdateLeave,
            RejectLeave,
            LeaveStatus,
            BalanceQuery,
            BalanceResponse,
            LeaveType,
            CreateLeaveType,
            CreateEmployee,
            Employee,
            EmployeeListResponse
        )
    ),
    tags(
        (name = "Leave", description = "Leave request and balance APIs"),
        (name = "LeaveType", description = "Leave type reference data APIs"),
        (name = "Employee", description = "Employee management APIs"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

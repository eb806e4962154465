use rocket::serde::json::Json;
use rocket::State;

use crate::models::ticket::TicketVerification;
use crate::services::ticket_service::TicketService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

// Target of the URI inside every ticket QR code, so it lives outside /api
#[get("/Tickets/Verify/<ticket_number>")]
pub async fn verify_ticket(
    ticket_number: &str,
    auth: AuthenticatedUser,
    ticket_service: &State<TicketService>,
) -> Result<Json<TicketVerification>, AppError> {
    let verification = ticket_service.verify_ticket(&auth.actor(), ticket_number).await?;
    Ok(Json(verification))
}

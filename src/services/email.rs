//! Email service for loan notifications

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::loan::{DecidedLoan, LoanStatus, RequestedLoan},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Notify library staff of a new loan request
    pub async fn send_loan_request_notice(
        &self,
        loan: &RequestedLoan,
        borrower_name: &str,
        borrower_email: &str,
    ) -> AppResult<()> {
        let subject = format!("[LOAN REQUEST] New request: {}", loan.title_name);
        let body = format!(
            r#"
A new loan request has been submitted.

Title: {title}
Item barcode: {barcode}
Requested by: {name} ({email})
Requested return date: {due}

Please open the admin panel to approve or reject this request.
"#,
            title = loan.title_name,
            barcode = loan.item_barcode,
            name = borrower_name,
            email = borrower_email,
            due = loan.due_date.format("%Y-%m-%d"),
        );

        self.send_email(&self.config.staff_address, &subject, &body)
            .await
    }

    /// Notify the borrower of a decision on their request
    pub async fn send_decision_notice(&self, loan: &DecidedLoan) -> AppResult<()> {
        let decision = match loan.status {
            LoanStatus::Approved => "approved",
            _ => "rejected",
        };
        let subject = format!("Your loan request has been {}", decision);
        let body = format!(
            r#"
Hello {name},

Your loan request for "{title}" has been {decision}.
"#,
            name = loan.borrower_name,
            title = loan.title_name,
            decision = decision,
        );

        self.send_email(&loan.borrower_email, &subject, &body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Pustaka");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace("\n", "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            // Use STARTTLS for secure connection
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(
                username.clone(),
                password.clone(),
            ))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

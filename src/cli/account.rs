use super::ui;
use crate::core::account::AccountService;
use crate::core::error::IdentityError;
use crate::core::identity::Session;
use crate::store::session::SessionStore;
use anyhow::Result;
use comfy_table::Cell;

fn signed_in(sessions: &SessionStore) -> Result<Session> {
    sessions
        .load()?
        .ok_or_else(|| IdentityError::NotSignedIn.into())
}

fn password_or_prompt(password: Option<String>, label: &str) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => ui::prompt_password(label),
    }
}

pub async fn register(
    service: &AccountService<'_>,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password, "Password")?;
    service
        .register(email, &password, first_name, last_name)
        .await?;
    println!(
        "{}",
        ui::style_text(
            "Registration successful! You can now login.",
            ui::StyleType::Success
        )
    );
    Ok(())
}

pub async fn login(
    service: &AccountService<'_>,
    sessions: &SessionStore,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password, "Password")?;
    let session = service.sign_in(email, &password).await?;
    sessions.save(&session)?;
    println!(
        "{}",
        ui::style_text("Login successful!", ui::StyleType::Success)
    );
    Ok(())
}

pub fn logout(sessions: &SessionStore) -> Result<()> {
    if sessions.clear()? {
        println!("Signed out.");
    } else {
        println!("You are not signed in.");
    }
    Ok(())
}

pub async fn whoami(service: &AccountService<'_>, sessions: &SessionStore) -> Result<()> {
    let session = signed_in(sessions)?;
    let Some(profile) = service.profile(&session).await? else {
        println!("Signed in as {} (no profile on record)", session.email);
        return Ok(());
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Account"), ui::header_cell("")]);
    table.add_row(vec![Cell::new("First name"), Cell::new(&profile.first_name)]);
    table.add_row(vec![Cell::new("Last name"), Cell::new(&profile.last_name)]);
    table.add_row(vec![Cell::new("Email"), Cell::new(&profile.email)]);
    let since = profile
        .created_at
        .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string());
    table.add_row(vec![Cell::new("Member since"), Cell::new(since)]);
    println!("{table}");
    Ok(())
}

pub async fn update_profile(
    service: &AccountService<'_>,
    sessions: &SessionStore,
    first_name: &str,
    last_name: &str,
) -> Result<()> {
    let session = signed_in(sessions)?;
    service
        .update_profile(&session, first_name, last_name)
        .await?;
    println!(
        "{}",
        ui::style_text("Profile updated successfully!", ui::StyleType::Success)
    );
    Ok(())
}

pub async fn change_password(
    service: &AccountService<'_>,
    sessions: &SessionStore,
    current_password: Option<String>,
    new_password: Option<String>,
) -> Result<()> {
    let session = signed_in(sessions)?;
    let current = password_or_prompt(current_password, "Current password")?;
    let (new, confirm) = match new_password {
        Some(new) => (new.clone(), new),
        None => (
            ui::prompt_password("New password")?,
            ui::prompt_password("Confirm new password")?,
        ),
    };

    let refreshed = service
        .change_password(&session, &current, &new, &confirm)
        .await
        .map_err(|e| match e {
            IdentityError::Request(_) | IdentityError::Rejected(_) => {
                anyhow::Error::new(e).context("Failed to change password. Please try again.")
            }
            other => other.into(),
        })?;
    sessions.save(&refreshed)?;
    println!(
        "{}",
        ui::style_text("Password changed successfully!", ui::StyleType::Success)
    );
    Ok(())
}

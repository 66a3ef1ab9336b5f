pub fn render_password_reset(reset_url: &str, expires_at: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Reset your password</h2>
    <p>Someone asked to reset the password on your DeliveryDesk account.</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #1f7a4d; color: white; text-decoration: none; border-radius: 4px;">Choose a new password</a></p>
    <p style="color: #666; font-size: 14px;">The link works once and expires at {expires_at}. If you didn't ask for this, ignore this email and your password stays the same.</p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_contains_link_and_expiry() {
        let html = render_password_reset(
            "http://localhost/reset-password?token=abc",
            "2026-01-01 10:00 UTC",
        );
        assert!(html.contains("href=\"http://localhost/reset-password?token=abc\""));
        assert!(html.contains("2026-01-01 10:00 UTC"));
    }
}

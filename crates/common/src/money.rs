/// Largest amount a single transaction, budget, goal or contribution may hold.
pub const MAX_AMOUNT_DOLLARS: f64 = 1_000_000_000.0;
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Converts a dollar amount from a form into cents, rounding to the nearest cent.
pub fn to_cents(dollars: f64) -> Result<i64, String> {
    if !dollars.is_finite() {
        return Err("Amount must be a number".to_string());
    }

    let cents = (dollars * 100.0).round() as i64;
    if cents <= 0 {
        return Err("Amount must be greater than zero".to_string());
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(format!("Amount cannot exceed {:.2}", MAX_AMOUNT_DOLLARS));
    }
    Ok(cents)
}

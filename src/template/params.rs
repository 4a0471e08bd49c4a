// src/template/params.rs

//! Parameter formatting for the two input templates.
//!
//! The legacy tools parse these values from fixed columns, so the precision
//! differs per tool.

use super::TemplateVars;

pub const TEFF_VAR: &str = "Teff";
pub const LOG_G_VAR: &str = "LogG";

/// Stage-1 model input: `Teff` with one decimal, `LogG` with two.
pub fn model_input_vars(teff: f64, log_g: f64) -> TemplateVars {
    TemplateVars::from([
        (TEFF_VAR, format!("{teff:.1}")),
        (LOG_G_VAR, format!("{log_g:.2}")),
    ])
}

/// Stage-2 runtime input: four decimals for both.
pub fn synthesis_input_vars(teff: f64, log_g: f64) -> TemplateVars {
    TemplateVars::from([
        (TEFF_VAR, format!("{teff:.4}")),
        (LOG_G_VAR, format!("{log_g:.4}")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::render;

    #[test]
    fn model_input_uses_one_and_two_decimals() {
        let out = render("{{.Teff}} {{.LogG}}", &model_input_vars(10125.4, 4.25)).unwrap();
        assert!(out.contains("10125.4"));
        assert!(out.contains("4.25"));
        assert_eq!(out, "10125.4 4.25");
    }

    #[test]
    fn synthesis_input_uses_four_decimals() {
        let out = render("{{.Teff}} {{.LogG}}", &synthesis_input_vars(10125.4, 4.25)).unwrap();
        assert_eq!(out, "10125.4000 4.2500");
    }

    #[test]
    fn rounding_follows_the_requested_precision() {
        let vars = model_input_vars(9999.96, 3.999);
        assert_eq!(vars[TEFF_VAR], "10000.0");
        assert_eq!(vars[LOG_G_VAR], "4.00");
    }
}

//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y normalización de payloads antes de enviarlos al store.

use chrono::NaiveDate;
use serde_json::Value;
use validator::ValidationError;

use crate::utils::errors::{validation_error, AppResult};

/// Validar que un string no esté vacío (uso con `#[validate(custom = ...)]`)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Exigir un valor no vacío para una precondición de flujo
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    if value.trim().is_empty() {
        return Err(validation_error(format!("{} es requerido", field)));
    }
    Ok(value)
}

/// Validar que un rango de fechas no esté invertido
pub fn validate_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(validation_error(format!(
                "El rango de fechas es inválido: {} es posterior a {}",
                start, end
            )));
        }
    }
    Ok(())
}

/// Convertir strings vacíos en `null` para los campos indicados.
///
/// El store nunca debe guardar `""` en campos opcionales (fechas, matrículas,
/// referencias); se aplica tanto al escribir como al leer.
pub fn null_if_empty(record: &mut Value, fields: &[&str]) {
    if let Value::Object(map) = record {
        for field in fields {
            if let Some(value) = map.get_mut(*field) {
                if matches!(value, Value::String(s) if s.trim().is_empty()) {
                    *value = Value::Null;
                }
            }
        }
    }
}

/// Componer una matrícula a partir de sus tres partes (ciudad, letras, números)
pub fn compose_plate(city: &str, letters: &str, numbers: &str) -> AppResult<String> {
    let city = city.trim();
    let letters = letters.trim();
    let numbers = numbers.trim();

    if city.is_empty() || letters.is_empty() || numbers.is_empty() {
        return Err(validation_error(
            "La matrícula requiere ciudad, letras y números",
        ));
    }

    Ok(format!(
        "{} {} {}",
        city.to_uppercase(),
        letters.to_uppercase(),
        numbers
    ))
}

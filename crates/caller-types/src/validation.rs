//! Configuration validation for implementation configs.
//!
//! Account and node implementations receive their own TOML tables from the
//! main configuration. This module provides a small schema framework those
//! implementations use to validate their tables before construction, with
//! typed fields and optional custom validators.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field is present but fails a custom validator.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong TOML type.
	#[error("Type mismatch for field '{field}': expected {expected}")]
	TypeMismatch { field: String, expected: String },
}

/// Expected type of a configuration field.
///
/// Implementation configs here are flat tables, so only scalar kinds are
/// modeled.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer value with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A boolean value.
	Boolean,
}

/// Custom validator run after the type check.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named, typed field in a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// A validation schema: required fields that must be present and optional
/// fields that are checked when present.
pub struct Schema {
	required: Vec<Field>,
	optional: Vec<Field>,
}

impl Schema {
	/// Creates a schema from required and optional field lists.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		for field in &self.required {
			match config.get(&field.name) {
				Some(value) => Self::check_field(field, value)?,
				None => return Err(ValidationError::MissingField(field.name.clone())),
			}
		}
		for field in &self.optional {
			if let Some(value) = config.get(&field.name) {
				Self::check_field(field, value)?;
			}
		}
		Ok(())
	}

	fn check_field(field: &Field, value: &toml::Value) -> Result<(), ValidationError> {
		match &field.field_type {
			FieldType::String => {
				if !value.is_str() {
					return Err(ValidationError::TypeMismatch {
						field: field.name.clone(),
						expected: "string".to_string(),
					});
				}
			}
			FieldType::Integer { min, max } => {
				let n = value
					.as_integer()
					.ok_or_else(|| ValidationError::TypeMismatch {
						field: field.name.clone(),
						expected: "integer".to_string(),
					})?;
				if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
					return Err(ValidationError::InvalidValue {
						field: field.name.clone(),
						message: format!("{} out of bounds", n),
					});
				}
			}
			FieldType::Boolean => {
				if !value.is_bool() {
					return Err(ValidationError::TypeMismatch {
						field: field.name.clone(),
						expected: "boolean".to_string(),
					});
				}
			}
		}
		if let Some(validator) = &field.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: field.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Trait implemented by each pluggable component to describe its
/// configuration requirements.
pub trait ConfigSchema: Send + Sync {
	/// Validates the implementation's TOML table.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

//! Core type model for sieve
//!
//! This crate holds the pieces every other sieve crate agrees on:
//!
//! - **Schema view**: named input types, output fields and their arguments
//! - **Declarations**: constraints attached to argument, input-field and field sites
//! - **Coordinates and paths**: where a site lives, and where a value sits inside a request
//! - **Errors**: configuration errors and run-aborting errors

pub mod coordinates;
pub mod declaration;
pub mod error;
pub mod path;
pub mod schema;

pub use coordinates::{FieldCoordinates, SiteCoordinates};
pub use declaration::ConstraintDeclaration;
pub use error::{ConfigError, Result, SieveError};
pub use path::{Path, PathSegment};
pub use schema::{
    EnumType, FieldDefinition, InputObjectType, InputType, InputValueDefinition, ObjectType,
    ScalarCategory, ScalarType, Schema, SchemaBuilder, SchemaDocument, TypeDefinition, TypeShape,
};

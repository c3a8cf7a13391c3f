use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::ArbiterConfig;

/// JSON schema for `arbiter.toml`, for editor tooling and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(ArbiterConfig)
}

use proof_types::ForensicCapsule;
use thiserror::Error;

/// Errors raised while assembling a [`ForensicCapsule`].
#[derive(Debug, Error)]
pub enum CapsuleError {
    /// A required field was never set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Builds a [`ForensicCapsule`] one field at a time.
///
/// Use `CapsuleBuilder::new()` to start. All six required fields (`t_run`,
/// `t_target`, `gate_policy_id`, `model_id`, `hash_prompt`, `output_hash`,
/// `context_merkle_root`) must be set before calling [`CapsuleBuilder::build`];
/// anything else is optional and simply omitted from the canonical form when
/// left unset.
///
/// # Example
///
/// ```rust
/// use proof_capsule::CapsuleBuilder;
///
/// let capsule = CapsuleBuilder::new()
///     .t_run(1_735_671_234)
///     .t_target(2025)
///     .gate_policy_id("strict")
///     .model_id("gpt-4")
///     .hash_prompt("deadbeef")
///     .output_hash("00".repeat(32))
///     .context_merkle_root("11".repeat(32))
///     .build()?;
/// # Ok::<(), proof_capsule::CapsuleError>(())
/// ```
#[derive(Default)]
#[must_use]
pub struct CapsuleBuilder {
    t_run: Option<i64>,
    t_target: Option<i64>,
    gate_policy_id: Option<String>,
    model_id: Option<String>,
    hash_prompt: Option<String>,
    output_hash: Option<String>,
    context_merkle_root: Option<String>,
    artifact_type: Option<String>,
    mode: Option<String>,
    hash_alg: Option<String>,
    snapshot_hash: Option<String>,
    normalization_params_id: Option<String>,
    proof_input: Option<serde_json::Value>,
    proof_input_hash: Option<String>,
}

impl CapsuleBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `t_run`, the Unix-seconds moment the capsule was built.
    pub const fn t_run(mut self, v: i64) -> Self {
        self.t_run = Some(v);
        self
    }
    /// Sets `t_target`, the declared temporal boundary.
    pub const fn t_target(mut self, v: i64) -> Self {
        self.t_target = Some(v);
        self
    }
    /// Sets the identifier of the temporal-gate policy that was applied.
    pub fn gate_policy_id(mut self, v: impl Into<String>) -> Self {
        self.gate_policy_id = Some(v.into());
        self
    }
    /// Sets the identifier of the model or tool that produced the artifact.
    pub fn model_id(mut self, v: impl Into<String>) -> Self {
        self.model_id = Some(v.into());
        self
    }
    /// Sets the caller-computed hash of the prompt.
    pub fn hash_prompt(mut self, v: impl Into<String>) -> Self {
        self.hash_prompt = Some(v.into());
        self
    }
    /// Sets the SHA-256 hex digest of the artifact's bytes.
    pub fn output_hash(mut self, v: impl Into<String>) -> Self {
        self.output_hash = Some(v.into());
        self
    }
    /// Sets the Merkle root over the gated context set.
    pub fn context_merkle_root(mut self, v: impl Into<String>) -> Self {
        self.context_merkle_root = Some(v.into());
        self
    }
    /// Sets the caller-declared artifact kind.
    pub fn artifact_type(mut self, v: impl Into<String>) -> Self {
        self.artifact_type = Some(v.into());
        self
    }
    /// Sets the caller-declared generation mode.
    pub fn mode(mut self, v: impl Into<String>) -> Self {
        self.mode = Some(v.into());
        self
    }
    /// Sets the hash algorithm name (conceptually defaults to `"sha256"`).
    pub fn hash_alg(mut self, v: impl Into<String>) -> Self {
        self.hash_alg = Some(v.into());
        self
    }
    /// Sets the hash of a normalized snapshot of the artifact.
    pub fn snapshot_hash(mut self, v: impl Into<String>) -> Self {
        self.snapshot_hash = Some(v.into());
        self
    }
    /// Sets the identifier of the normalization parameters used above.
    pub fn normalization_params_id(mut self, v: impl Into<String>) -> Self {
        self.normalization_params_id = Some(v.into());
        self
    }
    /// Embeds the proof-input manifest inline, alongside its hash.
    pub fn proof_input(mut self, value: serde_json::Value, hash: impl Into<String>) -> Self {
        self.proof_input = Some(value);
        self.proof_input_hash = Some(hash.into());
        self
    }

    /// Validates that every required field was set and assembles the capsule.
    ///
    /// # Errors
    ///
    /// Returns `CapsuleError::MissingField` naming the first unset required
    /// field.
    pub fn build(self) -> Result<ForensicCapsule, CapsuleError> {
        Ok(ForensicCapsule {
            t_run: self.t_run.ok_or(CapsuleError::MissingField("t_run"))?,
            t_target: self.t_target.ok_or(CapsuleError::MissingField("t_target"))?,
            gate_policy_id: self
                .gate_policy_id
                .ok_or(CapsuleError::MissingField("gate_policy_id"))?,
            model_id: self.model_id.ok_or(CapsuleError::MissingField("model_id"))?,
            hash_prompt: self
                .hash_prompt
                .ok_or(CapsuleError::MissingField("hash_prompt"))?,
            output_hash: self
                .output_hash
                .ok_or(CapsuleError::MissingField("output_hash"))?,
            context_merkle_root: self
                .context_merkle_root
                .ok_or(CapsuleError::MissingField("context_merkle_root"))?,
            artifact_type: self.artifact_type,
            mode: self.mode,
            hash_alg: self.hash_alg,
            snapshot_hash: self.snapshot_hash,
            normalization_params_id: self.normalization_params_id,
            proof_input: self.proof_input,
            proof_input_hash: self.proof_input_hash,
        })
    }
}

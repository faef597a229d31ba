//! Clap command tree: `attest`, `proof`, `verify`, plus the `keygen` and
//! `completions` conveniences every CLI in this workspace carries.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use proof_bundle::{ObjectVerdict, VerifyReport};
use proof_canon::{sha256_hex, sha256_hex_file};
use proof_capsule::{capsule_hash, CapsuleBuilder, ProofInputManifest};
use proof_context::{gate, merkle_root_hex};
use proof_crypto::{Keypair, Verdict};
use proof_ledger::Ledger;
use proof_types::{ContextItem, ForensicCapsule};
use std::{fs, path::PathBuf, time::SystemTime};

#[derive(Parser)]
#[command(name = "proof")]
#[command(about = "Generate and verify portable cryptographic proof bundles")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Attest one artifact: hash it, gate its context, build a capsule,
    /// append it to a ledger, and assemble a bundle.
    Attest {
        /// Declared temporal boundary (Unix seconds or a caller-chosen epoch).
        #[arg(long)]
        t_target: i64,
        /// Temporal gate policy id (`strict`, `none`, ...).
        #[arg(long)]
        policy: String,
        /// Read the artifact's exact bytes from this file.
        #[arg(long, conflicts_with_all = ["file", "hash"])]
        text_file: Option<PathBuf>,
        /// Hash this file's bytes (streamed, for large artifacts).
        #[arg(long, conflicts_with_all = ["text_file", "hash"])]
        file: Option<PathBuf>,
        /// Use this precomputed hex SHA-256 as the artifact's output hash.
        #[arg(long, conflicts_with_all = ["text_file", "file"])]
        hash: Option<String>,
        /// Identifier of the model or tool that produced the artifact.
        #[arg(long, default_value = "unknown")]
        model_id: String,
        /// Directory the bundle (and, by default, the ledger) are written under.
        #[arg(long)]
        out_dir: PathBuf,
        /// JSON file holding a `ContextItem` array available at generation time.
        #[arg(long)]
        context: Option<PathBuf>,
        /// Text whose SHA-256 becomes `hash_prompt`; defaults to the empty string.
        #[arg(long)]
        prompt: Option<String>,
        /// Ledger file to append to; defaults to `<out_dir>/ledger.sqlite`.
        #[arg(long)]
        ledger: Option<PathBuf>,
        /// 32-byte hex Ed25519 seed to sign the proof-input manifest with.
        #[arg(long)]
        sign_seed_hex: Option<String>,
        /// Caller-declared artifact kind (e.g. `text`, `code`).
        #[arg(long)]
        artifact_type: Option<String>,
        /// Caller-declared generation mode.
        #[arg(long)]
        mode: Option<String>,
    },
    /// Print a human-readable proof block for a capsule bound into a ledger.
    Proof {
        /// Path to the capsule's canonical JSON file.
        #[arg(long)]
        capsule: PathBuf,
        /// Path to the ledger SQLite file.
        #[arg(long)]
        ledger: PathBuf,
    },
    /// Verify a capsule against a ledger, and optionally a manifest and artifact.
    Verify {
        /// Path to the capsule's canonical JSON file.
        #[arg(long)]
        capsule: PathBuf,
        /// Path to the ledger SQLite file.
        #[arg(long)]
        ledger: PathBuf,
        /// Original artifact to re-hash and compare to `output_hash`.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Proof-input manifest JSON file.
        #[arg(long = "proof-input")]
        proof_input: Option<PathBuf>,
        /// Base64 public key to compare against the manifest's signer for `ORIGIN_SPE`.
        #[arg(long)]
        known_key: Option<String>,
    },
    /// Generate an Ed25519 keypair for signing proof-input manifests.
    Keygen {
        /// Write the seed (hex) to this file instead of stdout.
        #[arg(long)]
        out_seed: Option<PathBuf>,
        /// Write the public key (base64) to this file instead of stdout.
        #[arg(long)]
        out_pub: Option<PathBuf>,
    },
    /// Print shell completion scripts.
    Completions {
        #[arg(long)]
        shell: String,
    },
}

/// Runs the CLI under `bin_name`.
///
/// # Errors
///
/// Propagates argument-parsing, I/O, and pipeline errors.
pub fn run(bin_name: &str) -> Result<()> {
    let mut cmd = Cli::command();
    let bin: &'static str = Box::leak(bin_name.to_string().into_boxed_str());
    cmd = cmd.name(bin);
    let matches = cmd.clone().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    match cli.cmd {
        Command::Attest {
            t_target,
            policy,
            text_file,
            file,
            hash,
            model_id,
            out_dir,
            context,
            prompt,
            ledger,
            sign_seed_hex,
            artifact_type,
            mode,
        } => cmd_attest(
            t_target,
            &policy,
            text_file,
            file,
            hash,
            &model_id,
            out_dir,
            context,
            prompt,
            ledger,
            sign_seed_hex,
            artifact_type,
            mode,
        ),
        Command::Proof { capsule, ledger } => cmd_proof(&capsule, &ledger),
        Command::Verify {
            capsule,
            ledger,
            file,
            proof_input,
            known_key,
        } => cmd_verify(&capsule, &ledger, file.as_deref(), proof_input.as_deref(), known_key.as_deref()),
        Command::Keygen { out_seed, out_pub } => cmd_keygen(out_seed, out_pub),
        Command::Completions { shell } => {
            cmd_completions(&shell, bin);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_attest(
    t_target: i64,
    policy: &str,
    text_file: Option<PathBuf>,
    file: Option<PathBuf>,
    hash: Option<String>,
    model_id: &str,
    out_dir: PathBuf,
    context: Option<PathBuf>,
    prompt: Option<String>,
    ledger_path: Option<PathBuf>,
    sign_seed_hex: Option<String>,
    artifact_type: Option<String>,
    mode: Option<String>,
) -> Result<()> {
    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir.display()))?;

    let mut artifact_text: Option<String> = None;
    let output_hash = match (text_file, file, hash) {
        (Some(path), None, None) => {
            let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            artifact_text = String::from_utf8(bytes.clone()).ok();
            sha256_hex(&bytes)
        }
        (None, Some(path), None) => {
            sha256_hex_file(&path).with_context(|| format!("hash {}", path.display()))?
        }
        (None, None, Some(hex)) => hex,
        _ => bail!("exactly one of --text_file, --file, --hash is required"),
    };

    let items: Vec<ContextItem> = match context {
        Some(path) => {
            let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&data).with_context(|| format!("parse context items in {}", path.display()))?
        }
        None => Vec::new(),
    };
    let gated = gate(&items, t_target, policy);
    let context_merkle_root = merkle_root_hex(&gated.items)?;
    tracing::debug!(kept = gated.items.len(), has_post_target = gated.has_post_target, "context gated");

    if let Some(text) = &artifact_text {
        let tvoc = proof_tvoc::detect(text, t_target, gated.has_post_target);
        if tvoc.verdict == proof_tvoc::Verdict::Strong {
            tracing::warn!(
                violating_years = ?tvoc.violating_years,
                t_target,
                "TVOC: STRONG — output references years beyond the declared boundary with no corroborating context"
            );
            eprintln!(
                "{} output references {:?} beyond t_target={} with no corroborating context",
                "TVOC STRONG:".yellow().bold(),
                tvoc.violating_years,
                t_target
            );
        }
    }

    let hash_prompt = prompt.map_or_else(|| sha256_hex(b""), |text| sha256_hex(text.as_bytes()));

    let t_run = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .context("system clock before the Unix epoch")?
        .as_secs() as i64;

    let mut manifest = ProofInputManifest::new();
    manifest.set("origin", "proof-cli");
    manifest.set("t_run", t_run);
    if let Some(seed_hex) = sign_seed_hex {
        let seed_bytes = hex::decode(&seed_hex).context("--sign-seed-hex is not valid hex")?;
        let seed: [u8; 32] = seed_bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("--sign-seed-hex must decode to 32 bytes"))?;
        manifest.sign(&seed)?;
    }
    let proof_input_hash = manifest.hash()?;
    let manifest_value = serde_json::to_value(&manifest)?;

    let mut builder = CapsuleBuilder::new()
        .t_run(t_run)
        .t_target(t_target)
        .gate_policy_id(policy)
        .model_id(model_id)
        .hash_prompt(hash_prompt)
        .output_hash(output_hash)
        .context_merkle_root(context_merkle_root)
        .proof_input(manifest_value, proof_input_hash);
    if let Some(v) = artifact_type {
        builder = builder.artifact_type(v);
    }
    if let Some(v) = mode {
        builder = builder.mode(v);
    }
    let capsule = builder.build()?;
    let hash = capsule_hash(&capsule)?;

    let ledger_path = ledger_path.unwrap_or_else(|| out_dir.join("ledger.sqlite"));
    let ledger = Ledger::open(&ledger_path).with_context(|| format!("open ledger {}", ledger_path.display()))?;
    let entry = ledger.append(&hash, t_run)?;
    tracing::info!(entry_id = entry.id, capsule_hash = %hash, "appended to ledger");

    let bundle_path = out_dir.join("bundle.zip");
    proof_bundle::assemble(&capsule, &ledger_path, &manifest, &bundle_path)?;

    println!("{} {}", "capsule_hash:".bold(), hash);
    println!("{} {}", "ledger_entry:".bold(), entry.id);
    println!("{} {}", "bundle:".bold(), bundle_path.display());
    Ok(())
}

fn cmd_proof(capsule_path: &std::path::Path, ledger_path: &std::path::Path) -> Result<()> {
    let bytes = fs::read(capsule_path).with_context(|| format!("read {}", capsule_path.display()))?;
    let capsule: ForensicCapsule = serde_json::from_slice(&bytes)?;
    let hash = sha256_hex(&bytes);

    let ledger = Ledger::open(ledger_path).with_context(|| format!("open {}", ledger_path.display()))?;
    let binding = ledger.capsule_binding(&hash)?;

    println!("{}", "Proof".bold());
    println!("  t_run               : {}", capsule.t_run);
    println!("  t_target            : {}", capsule.t_target);
    println!("  gate_policy_id      : {}", capsule.gate_policy_id);
    println!("  model_id            : {}", capsule.model_id);
    println!("  output_hash         : {}", capsule.output_hash);
    println!("  context_merkle_root : {}", capsule.context_merkle_root);
    println!("  capsule_hash        : {hash}");
    match binding {
        Some(entry) => println!("  ledger_entry        : {} (bound)", entry.id),
        None => println!("  ledger_entry        : {}", "not bound".red()),
    }
    Ok(())
}

fn cmd_verify(
    capsule_path: &std::path::Path,
    ledger_path: &std::path::Path,
    artifact_path: Option<&std::path::Path>,
    proof_input_path: Option<&std::path::Path>,
    known_key: Option<&str>,
) -> Result<()> {
    let capsule_bytes = fs::read(capsule_path).with_context(|| format!("read {}", capsule_path.display()))?;
    let capsule: ForensicCapsule = serde_json::from_slice(&capsule_bytes)?;
    let capsule_hash_value = sha256_hex(&capsule_bytes);

    let ledger = Ledger::open(ledger_path).with_context(|| format!("open {}", ledger_path.display()))?;
    let ledger_outcome = ledger.verify()?;
    let binding = ledger.capsule_binding(&capsule_hash_value)?;
    let capsule_binding = if binding.is_some() { ObjectVerdict::Match } else { ObjectVerdict::Mismatch };

    let manifest = match proof_input_path {
        Some(path) => {
            let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&data).with_context(|| format!("parse {}", path.display()))?
        }
        None => ProofInputManifest::new(),
    };
    let signature = manifest.verify_signature()?;
    let proof_input_hash = manifest.hash()?;
    let origin_known = known_key.map(|known| {
        manifest
            .signature
            .as_ref()
            .is_some_and(|sig| sig.public_key == known)
    });

    let object = artifact_path
        .map(|path| -> Result<ObjectVerdict> {
            let recomputed = sha256_hex_file(path)?;
            let declared = capsule.output_hash.strip_prefix("sha256:").unwrap_or(&capsule.output_hash);
            Ok(if recomputed == declared {
                ObjectVerdict::Match
            } else {
                ObjectVerdict::Mismatch
            })
        })
        .transpose()?;

    let report = VerifyReport {
        capsule_hash: capsule_hash_value,
        ledger: ledger_outcome,
        capsule_binding,
        signature,
        proof_input_hash,
        origin_known,
        object,
    };

    for line in report.to_lines() {
        println!("{line}");
    }
    if exit_ok(&report) {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn exit_ok(report: &VerifyReport) -> bool {
    use proof_ledger::VerifyOutcome;
    let ledger_ok = report.ledger == VerifyOutcome::Valid;
    let binding_ok = report.capsule_binding == ObjectVerdict::Match;
    let signature_ok = matches!(report.signature, Verdict::Valid | Verdict::Unknown);
    let object_ok = report.object.map_or(true, |o| o == ObjectVerdict::Match);
    ledger_ok && binding_ok && signature_ok && object_ok
}

fn cmd_keygen(out_seed: Option<PathBuf>, out_pub: Option<PathBuf>) -> Result<()> {
    let kp = Keypair::generate();
    let seed_hex = hex::encode(kp.sk.0);
    let pub_b64 = proof_crypto::b64_encode(kp.vk.as_bytes());
    if let (Some(seed_path), Some(pub_path)) = (out_seed, out_pub) {
        fs::write(&seed_path, &seed_hex)?;
        fs::write(&pub_path, &pub_b64)?;
        println!("wrote seed -> {}, public key -> {}", seed_path.display(), pub_path.display());
    } else {
        println!("seed(hex)={seed_hex}");
        println!("public_key(b64)={pub_b64}");
    }
    Ok(())
}

fn cmd_completions(shell: &str, bin_name: &'static str) {
    use clap_complete::{generate, shells};
    use std::io;
    let mut cmd = Cli::command();
    cmd = cmd.name(bin_name);
    match shell {
        "bash" => generate(shells::Bash, &mut cmd, bin_name, &mut io::stdout()),
        "zsh" => generate(shells::Zsh, &mut cmd, bin_name, &mut io::stdout()),
        "fish" => generate(shells::Fish, &mut cmd, bin_name, &mut io::stdout()),
        "powershell" => generate(shells::PowerShell, &mut cmd, bin_name, &mut io::stdout()),
        "elvish" => generate(shells::Elvish, &mut cmd, bin_name, &mut io::stdout()),
        _ => eprintln!("unknown shell: {shell}"),
    }
}

use anyhow::{anyhow, bail, Context, Result};
use ftag_rs::kernel::KernelLifecycle;
use ftag_rs::signal::traits::{FrequencySelectNd, SnrSpectrumNd};
use ftag_rs::signal::{
    grand_average, psd_db_summary,
    snr_at_frequency as snr_at_frequency_baseline, snr_spectrum as snr_spectrum_baseline,
    topography_average, SnrAtFrequencyConfig, SnrAtFrequencyKernel, SnrSpectrumConfig,
    SnrSpectrumKernel,
};
use ftag_rs::FtSpectra;
use log::info;
use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const DEFAULT_PYTHON_BIN: &str = "python";

/// Frequency resolution of the synthetic spectra in Hz.
const RESOLUTION_HZ: f64 = 0.25;

const STIM_FREQS: [f64; 2] = [7.5, 12.0];

const PY_SPECTRUM_SCRIPT: &str = r#"
import json
import sys
import time
import warnings
import numpy as np

warnings.simplefilter("ignore", category=RuntimeWarning)

env = json.loads(sys.stdin.read())
op = env["op"]
iters = int(env["iters"])
p = env["payload"]

def _tensor(key):
    return np.asarray(p[key], dtype=float).reshape(p[key + "_shape"])

def _snr_spectrum(psd, n, s):
    kernel = np.concatenate((np.ones(n), np.zeros(2 * s + 1), np.ones(n)))
    kernel /= kernel.sum()
    noise = np.apply_along_axis(lambda x: np.convolve(x, kernel, mode="valid"), -1, psd)
    edge = n + s
    pad = [(0, 0)] * (psd.ndim - 1) + [(edge, edge)]
    noise = np.pad(noise, pad, "constant", constant_values=np.nan)
    return psd / noise

def _nearest(freqs, target):
    return int(np.argmin(np.abs(freqs - target)))

def _compute():
    if op == "snr_spectrum":
        return _snr_spectrum(_tensor("psd"), int(p["neighbor_count"]), int(p["skip_count"]))
    if op == "snr_at_frequency":
        freqs = np.asarray(p["freqs"], dtype=float)
        return _tensor("snr")[..., _nearest(freqs, float(p["target_freq"]))]
    if op == "grand_average":
        snr = _tensor("snr")
        while snr.ndim > 1:
            snr = np.nanmean(snr, axis=0)
        return snr
    if op == "topography":
        snr = _tensor("snr_at_freq")
        if snr.ndim == 3:
            snr = np.nanmean(snr, axis=2)
        if snr.ndim == 2:
            snr = np.nanmean(snr, axis=0)
        return snr
    if op == "psd_db_summary":
        freqs = np.asarray(p["freqs"], dtype=float)
        mask = (freqs >= float(p["fmin"])) & (freqs <= float(p["fmax"]))
        db = 10.0 * np.log10(_tensor("psd")[..., mask])
        db = db.reshape(-1, db.shape[-1])
        return np.concatenate([db.mean(axis=0), db.std(axis=0)])

    raise RuntimeError(f"unsupported op: {op}")

y = np.asarray(_compute(), dtype=float).reshape(-1)

t0 = time.perf_counter_ns()
for _ in range(iters):
    _compute()
t1 = time.perf_counter_ns()

print(json.dumps({
    "output": [float(v) if np.isfinite(v) else None for v in y],
    "avg_ns": (t1 - t0) / max(iters, 1),
    "python_version": sys.version.split()[0],
    "numpy_version": np.__version__
}))
"#;

/// Reference output. Non-finite values travel as `null`.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct PythonEval {
    output: Vec<Option<f64>>,
    avg_ns: f64,
    python_version: String,
    numpy_version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    compared: usize,
    undefined_mismatch: usize,
    pearson_r: f64,
    mae: f64,
    rmse: f64,
    max_abs: f64,
    rust_candidate_ns: f64,
    rust_baseline_ns: f64,
    python_ns: f64,
    speedup_vs_baseline: f64,
    speedup_vs_python: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    python_executable: String,
    python_version: String,
    numpy_version: String,
    rows: Vec<ContractRow>,
}

fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => run_contracts(),
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- contracts");
            Ok(())
        }
    }
}

fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    let python_bin = detect_python_bin();
    let mut rows = Vec::new();

    // Shared synthetic recording: 6 trials, 8 channels, 0..50 Hz.
    let (freqs, psd3) = synthetic_psd(6, 8, 201);
    let psd2 = psd3.index_axis(ndarray::Axis(0), 0).to_owned();
    let ch_names: Vec<String> = (0..8).map(|c| format!("E{}", c + 1)).collect();
    let spectra = FtSpectra::try_new(freqs.clone(), psd3.clone(), ch_names, STIM_FREQS.to_vec())
        .map_err(|e| anyhow!("building spectra record failed: {e}"))?
        .with_snr_spectrum(SnrSpectrumConfig {
            neighbor_count: 2,
            skip_count: 2,
        })
        .map_err(|e| anyhow!("deriving snr spectrum failed: {e}"))?;
    let snr3 = spectra
        .snr()
        .context("spectra record carries no snr spectrum")?
        .clone();

    // SNR spectrum, channels only
    {
        let case_id = "snr_spectrum_2d_f64";
        let config = SnrSpectrumConfig {
            neighbor_count: 3,
            skip_count: 1,
        };
        let kernel = SnrSpectrumKernel::try_new(config)?;
        let candidate = kernel
            .run_alloc(&psd2)
            .map_err(|e| anyhow!("snr spectrum candidate failed: {e}"))?;
        let baseline = snr_spectrum_baseline(&psd2, 3, 1)
            .map_err(|e| anyhow!("snr spectrum baseline failed: {e}"))?;
        let py = python_spectrum_eval(
            &python_bin,
            "snr_spectrum",
            json!({
                "psd": flatten(&psd2),
                "psd_shape": psd2.shape(),
                "neighbor_count": config.neighbor_count,
                "skip_count": config.skip_count
            }),
            100,
        )?;

        let candidate_ns = benchmark_avg_ns(200, || {
            kernel
                .run_alloc(&psd2)
                .map(|_| ())
                .map_err(|e| anyhow!("snr spectrum candidate benchmark failed: {e}"))
        })?;
        let baseline_ns = benchmark_avg_ns(200, || {
            snr_spectrum_baseline(&psd2, 3, 1)
                .map(|_| ())
                .map_err(|e| anyhow!("snr spectrum baseline benchmark failed: {e}"))
        })?;

        record_case(
            &mut rows,
            case_id,
            flatten(&candidate),
            flatten(&baseline),
            py,
            candidate_ns,
            baseline_ns,
        )?;
    }

    // SNR spectrum, trials and channels
    {
        let case_id = "snr_spectrum_3d_f64";
        let kernel = SnrSpectrumKernel::try_new(SnrSpectrumConfig {
            neighbor_count: 2,
            skip_count: 2,
        })?;
        let candidate = kernel
            .run_alloc(&psd3)
            .map_err(|e| anyhow!("snr spectrum candidate failed: {e}"))?;
        let py = python_spectrum_eval(
            &python_bin,
            "snr_spectrum",
            json!({
                "psd": flatten(&psd3),
                "psd_shape": psd3.shape(),
                "neighbor_count": 2,
                "skip_count": 2
            }),
            50,
        )?;

        let candidate_ns = benchmark_avg_ns(60, || {
            kernel
                .run_alloc(&psd3)
                .map(|_| ())
                .map_err(|e| anyhow!("snr spectrum candidate benchmark failed: {e}"))
        })?;
        let baseline_ns = benchmark_avg_ns(60, || {
            snr_spectrum_baseline(&psd3, 2, 2)
                .map(|_| ())
                .map_err(|e| anyhow!("snr spectrum baseline benchmark failed: {e}"))
        })?;

        record_case(
            &mut rows,
            case_id,
            flatten(&candidate),
            flatten(&snr3),
            py,
            candidate_ns,
            baseline_ns,
        )?;
    }

    // Nearest-bin selection, once per stimulation frequency
    for (idx, target_freq) in STIM_FREQS.iter().copied().enumerate() {
        let case_id = format!("snr_at_frequency_{target_freq}hz_f64");
        let kernel = SnrAtFrequencyKernel::try_new(SnrAtFrequencyConfig { target_freq })?;
        let candidate = kernel
            .run_alloc(&snr3, &freqs)
            .map_err(|e| anyhow!("snr selection candidate failed: {e}"))?;
        let baseline = spectra
            .snr_at_stim_frequency(idx)
            .map_err(|e| anyhow!("snr selection baseline failed: {e}"))?;
        let py = python_spectrum_eval(
            &python_bin,
            "snr_at_frequency",
            json!({
                "snr": flatten(&snr3),
                "snr_shape": snr3.shape(),
                "freqs": freqs.to_vec(),
                "target_freq": target_freq
            }),
            200,
        )?;

        let candidate_ns = benchmark_avg_ns(400, || {
            kernel
                .run_alloc(&snr3, &freqs)
                .map(|_| ())
                .map_err(|e| anyhow!("snr selection candidate benchmark failed: {e}"))
        })?;
        let freq_slice = freqs.to_vec();
        let baseline_ns = benchmark_avg_ns(400, || {
            snr_at_frequency_baseline(&snr3, &freq_slice, target_freq)
                .map(|_| ())
                .map_err(|e| anyhow!("snr selection baseline benchmark failed: {e}"))
        })?;

        record_case(
            &mut rows,
            &case_id,
            flatten(&candidate),
            flatten(&baseline),
            py,
            candidate_ns,
            baseline_ns,
        )?;
    }

    // Grand-average SNR spectrum
    {
        let case_id = "grand_average_f64";
        let candidate = grand_average(&snr3)
            .map_err(|e| anyhow!("grand average candidate failed: {e}"))?;
        let baseline = spectra
            .snr_spectrum_summary()
            .map_err(|e| anyhow!("snr spectrum summary failed: {e}"))?
            .grand;
        let py = python_spectrum_eval(
            &python_bin,
            "grand_average",
            json!({ "snr": flatten(&snr3), "snr_shape": snr3.shape() }),
            100,
        )?;

        let candidate_ns = benchmark_avg_ns(200, || {
            let _ = grand_average(&snr3)?;
            Ok(())
        })?;
        let baseline_ns = benchmark_avg_ns(200, || {
            let _ = spectra.snr_spectrum_summary()?;
            Ok(())
        })?;

        record_case(
            &mut rows,
            case_id,
            candidate.to_vec(),
            baseline.to_vec(),
            py,
            candidate_ns,
            baseline_ns,
        )?;
    }

    // Topography at the first stimulation frequency
    {
        let case_id = "topography_f64";
        let snr_at_freq = spectra
            .snr_at_stim_frequency(0)
            .map_err(|e| anyhow!("snr selection failed: {e}"))?;
        let candidate = topography_average(&snr_at_freq)
            .map_err(|e| anyhow!("topography candidate failed: {e}"))?;
        let baseline = spectra
            .topography(0)
            .map_err(|e| anyhow!("topography baseline failed: {e}"))?;
        let py = python_spectrum_eval(
            &python_bin,
            "topography",
            json!({
                "snr_at_freq": flatten(&snr_at_freq),
                "snr_at_freq_shape": snr_at_freq.shape()
            }),
            400,
        )?;

        let candidate_ns = benchmark_avg_ns(1000, || {
            let _ = topography_average(&snr_at_freq)?;
            Ok(())
        })?;
        let baseline_ns = benchmark_avg_ns(1000, || {
            let _ = spectra.topography(0)?;
            Ok(())
        })?;

        record_case(
            &mut rows,
            case_id,
            candidate.to_vec(),
            baseline.to_vec(),
            py,
            candidate_ns,
            baseline_ns,
        )?;
    }

    // PSD decibel summary over the tagged band, mean then spread
    {
        let case_id = "psd_db_summary_f64";
        let (fmin, fmax) = (5.0, 15.0);
        let summary = psd_db_summary(&psd3, &freqs, Some(fmin), Some(fmax))
            .map_err(|e| anyhow!("psd summary candidate failed: {e}"))?;
        let stored = spectra
            .psd_summary(Some(fmin), Some(fmax))
            .map_err(|e| anyhow!("psd summary baseline failed: {e}"))?;
        let py = python_spectrum_eval(
            &python_bin,
            "psd_db_summary",
            json!({
                "psd": flatten(&psd3),
                "psd_shape": psd3.shape(),
                "freqs": freqs.to_vec(),
                "fmin": fmin,
                "fmax": fmax
            }),
            100,
        )?;

        let candidate_ns = benchmark_avg_ns(200, || {
            let _ = psd_db_summary(&psd3, &freqs, Some(fmin), Some(fmax))?;
            Ok(())
        })?;
        let baseline_ns = benchmark_avg_ns(200, || {
            let _ = spectra.psd_summary(Some(fmin), Some(fmax))?;
            Ok(())
        })?;

        record_case(
            &mut rows,
            case_id,
            summary.mean_db.iter().chain(summary.std_db.iter()).copied().collect(),
            stored.mean_db.iter().chain(stored.std_db.iter()).copied().collect(),
            py,
            candidate_ns,
            baseline_ns,
        )?;
    }

    let version_probe = python_versions(&python_bin)?;
    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        python_executable: python_bin.to_string_lossy().into_owned(),
        python_version: version_probe.python_version,
        numpy_version: version_probe.numpy_version,
        rows,
    };

    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;
    fs::write(
        out_dir.join("summary.json"),
        serde_json::to_vec_pretty(&bundle).context("serializing summary bundle")?,
    )
    .context("writing summary.json")?;

    println!("Contract artifacts generated in: {}", out_dir.display());
    println!("  - {}", out_dir.join("summary.csv").display());
    println!("  - {}", out_dir.join("summary.json").display());
    println!("  - cases: {}", bundle.rows.len());

    Ok(())
}

/// Deterministic `[trials x channels x freqs]` PSD with a 1/f floor and
/// tagged peaks at [`STIM_FREQS`].
fn synthetic_psd(trials: usize, channels: usize, n_freqs: usize) -> (Array1<f64>, Array3<f64>) {
    let freqs = Array1::from_shape_fn(n_freqs, |k| k as f64 * RESOLUTION_HZ);
    let psd = Array3::from_shape_fn((trials, channels, n_freqs), |(t, c, k)| {
        let f = freqs[k];
        let wobble = (t as f64 * 1.7 + c as f64 * 0.9 + k as f64 * 0.37).sin();
        let floor = (1.0 + 0.3 * wobble * wobble) / (1.0 + f);
        let tagged = STIM_FREQS
            .iter()
            .any(|s| (f - s).abs() < 0.5 * RESOLUTION_HZ);
        if tagged {
            floor * (4.0 + c as f64)
        } else {
            floor
        }
    });
    (freqs, psd)
}

fn flatten<S, D>(a: &ndarray::ArrayBase<S, D>) -> Vec<f64>
where
    S: ndarray::Data<Elem = f64>,
    D: ndarray::Dimension,
{
    a.iter().copied().collect()
}

fn detect_python_bin() -> PathBuf {
    PathBuf::from(DEFAULT_PYTHON_BIN)
}

fn python_versions(python_bin: &Path) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        r#"
import json, sys
import numpy
payload = json.loads(sys.stdin.read())
print(json.dumps({
    "output": [],
    "avg_ns": 0.0,
    "python_version": sys.version.split()[0],
    "numpy_version": numpy.__version__
}))
"#,
        json!({}),
    )
}

fn python_spectrum_eval(
    python_bin: &Path,
    op: &str,
    payload: serde_json::Value,
    iters: usize,
) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        PY_SPECTRUM_SCRIPT,
        json!({
            "op": op,
            "iters": iters,
            "payload": payload
        }),
    )
}

fn run_python_eval(
    python_bin: &Path,
    script: &str,
    payload: serde_json::Value,
) -> Result<PythonEval> {
    let mut child = Command::new(python_bin)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning python interpreter at {}", python_bin.display()))?;

    {
        let stdin = child.stdin.as_mut().context("opening python stdin")?;
        let payload_bytes = serde_json::to_vec(&payload).context("serializing python payload")?;
        stdin
            .write_all(&payload_bytes)
            .context("writing payload to python stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("waiting for python process")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("python execution failed: {stderr}");
    }
    let stdout = String::from_utf8(output.stdout).context("parsing python stdout utf8")?;
    let parsed: PythonEval = serde_json::from_str(stdout.trim()).context("parsing python json")?;
    Ok(parsed)
}

fn record_case(
    rows: &mut Vec<ContractRow>,
    case_id: &str,
    candidate: Vec<f64>,
    baseline: Vec<f64>,
    py: PythonEval,
    candidate_ns: f64,
    baseline_ns: f64,
) -> Result<()> {
    ensure_same_length(case_id, candidate.len(), baseline.len())?;
    ensure_same_length(case_id, candidate.len(), py.output.len())?;

    // The candidate must agree bit for bit with the baseline, NaN included.
    if let Some(k) = candidate
        .iter()
        .zip(baseline.iter())
        .position(|(a, b)| !(a == b || (a.is_nan() && b.is_nan())))
    {
        bail!(
            "case {case_id} diverges from its baseline at {k}: {} vs {}",
            candidate[k],
            baseline[k]
        );
    }

    let mut undefined_mismatch = 0;
    let mut rust_defined = Vec::with_capacity(candidate.len());
    let mut python_defined = Vec::with_capacity(candidate.len());
    for (value, reference) in candidate.iter().zip(py.output.iter()) {
        match (value.is_finite(), reference) {
            (true, Some(r)) => {
                rust_defined.push(*value);
                python_defined.push(*r);
            }
            (false, None) => {}
            _ => undefined_mismatch += 1,
        }
    }

    let row = build_row(RowBuildInput {
        case_id,
        rust_candidate: &rust_defined,
        python_reference: &python_defined,
        undefined_mismatch,
        rust_candidate_ns: candidate_ns,
        rust_baseline_ns: baseline_ns,
        python_ns: py.avg_ns,
    });
    info!(
        "{case_id}: {} values, {} undefined mismatches, max |err| {:.3e}",
        row.compared, row.undefined_mismatch, row.max_abs
    );
    rows.push(row);

    Ok(())
}

fn ensure_same_length(case_id: &str, a: usize, b: usize) -> Result<()> {
    if a != b {
        bail!("case {case_id} has mismatched output lengths: left={a}, right={b}");
    }
    Ok(())
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

struct RowBuildInput<'a> {
    case_id: &'a str,
    rust_candidate: &'a [f64],
    python_reference: &'a [f64],
    undefined_mismatch: usize,
    rust_candidate_ns: f64,
    rust_baseline_ns: f64,
    python_ns: f64,
}

fn build_row(args: RowBuildInput<'_>) -> ContractRow {
    ContractRow {
        case_id: args.case_id.to_string(),
        compared: args.rust_candidate.len(),
        undefined_mismatch: args.undefined_mismatch,
        pearson_r: pearson(args.rust_candidate, args.python_reference),
        mae: mean_abs_error(args.rust_candidate, args.python_reference),
        rmse: root_mean_squared_error(args.rust_candidate, args.python_reference),
        max_abs: max_abs_error(args.rust_candidate, args.python_reference),
        rust_candidate_ns: args.rust_candidate_ns,
        rust_baseline_ns: args.rust_baseline_ns,
        python_ns: args.python_ns,
        speedup_vs_baseline: args.rust_baseline_ns / args.rust_candidate_ns,
        speedup_vs_python: args.python_ns / args.rust_candidate_ns,
    }
}

fn mean_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
        / a.len() as f64
}

fn root_mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    (a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        / a.len() as f64)
        .sqrt()
}

fn max_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = *x - mean_a;
        let db = *y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        if a == b {
            1.0
        } else {
            0.0
        }
    } else {
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,compared,undefined_mismatch,pearson_r,mae,rmse,max_abs,rust_candidate_ns,rust_baseline_ns,python_ns,speedup_vs_baseline,speedup_vs_python\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{:.12},{:.12},{:.12},{:.12},{:.3},{:.3},{:.3},{:.6},{:.6}\n",
            row.case_id,
            row.compared,
            row.undefined_mismatch,
            row.pearson_r,
            row.mae,
            row.rmse,
            row.max_abs,
            row.rust_candidate_ns,
            row.rust_baseline_ns,
            row.python_ns,
            row.speedup_vs_baseline,
            row.speedup_vs_python
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_psd_tags_stimulation_bins() {
        let (freqs, psd) = synthetic_psd(2, 3, 81);
        assert_eq!(freqs[30], 7.5);
        assert_eq!(freqs[48], 12.0);
        assert!(psd[[0, 0, 30]] > 2.0 * psd[[0, 0, 29]]);
        assert!(psd[[1, 2, 48]] > 2.0 * psd[[1, 2, 47]]);
    }

    #[test]
    fn undefined_values_are_matched_not_compared() {
        let mut rows = Vec::new();
        let py = PythonEval {
            output: vec![None, Some(2.0), Some(3.5), None],
            avg_ns: 10.0,
            python_version: "3".into(),
            numpy_version: "2".into(),
        };
        let candidate = vec![f64::NAN, 2.0, 3.0, 1.0];
        record_case(&mut rows, "case", candidate.clone(), candidate, py, 5.0, 5.0)
            .expect("recorded");
        assert_eq!(rows[0].compared, 2);
        assert_eq!(rows[0].undefined_mismatch, 1);
        assert_eq!(rows[0].max_abs, 0.5);
    }

    #[test]
    fn baseline_divergence_fails_the_case() {
        let mut rows = Vec::new();
        let py = PythonEval {
            output: vec![Some(1.0)],
            avg_ns: 1.0,
            python_version: "3".into(),
            numpy_version: "2".into(),
        };
        assert!(record_case(&mut rows, "case", vec![1.0], vec![1.5], py, 1.0, 1.0).is_err());
    }

    #[test]
    fn failing_baseline_aborts_timing() {
        let psd = Array1::<f64>::ones(16);
        let timed = benchmark_avg_ns(3, || {
            snr_spectrum_baseline(&psd, 3, 1)
                .map(|_| ())
                .map_err(|e| anyhow!("snr spectrum baseline benchmark failed: {e}"))
        });
        assert!(timed.is_err());

        let psd = ndarray::Array2::<f64>::ones((1, 16));
        let timed = benchmark_avg_ns(3, || {
            snr_spectrum_baseline(&psd, 3, 1)
                .map(|_| ())
                .map_err(|e| anyhow!("snr spectrum baseline benchmark failed: {e}"))
        });
        assert!(timed.is_ok());
    }
}

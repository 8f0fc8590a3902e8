//! X3DB demo
//!
//! Builds a synthetic terrain scene (a height-mapped grid mesh with per-vertex
//! colors), encodes it with the binary codec, and compares the result against
//! the same scene written as X3D XML text and gzip'd. Reports sizes, timings
//! and the largest float error introduced by quantization.

use std::fmt::Write as _;
use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;

use x3db_core::{AttributeValue, TypedArray};
use x3db_scene::{ContainerCodec, ContainerConfig, SceneNode};

// ── constants ──────────────────────────────────────────────────────────────

const GRID: usize = 256;
const SPACING: f32 = 0.5;
const TOLERANCES: &[f32] = &[0.0, 9.0e-7, 1.0e-4, 1.0e-2];

// ── data generator ──────────────────────────────────────────────────────────

/// Deterministic rolling hills with a little LCG noise.
fn heights(seed: u64) -> Vec<f32> {
    let mut rng = seed;
    (0..GRID * GRID)
        .map(|i| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let (x, z) = ((i % GRID) as f32, (i / GRID) as f32);
            let noise = ((rng >> 40) as f32 / (1u64 << 24) as f32 - 0.5) * 0.05;
            (x * 0.05).sin() * 4.0 + (z * 0.031).cos() * 6.0 + noise
        })
        .collect()
}

fn terrain_scene() -> SceneNode {
    let h = heights(42);
    let mut points = Vec::with_capacity(GRID * GRID * 3);
    let mut colors = Vec::with_capacity(GRID * GRID * 3);
    for (i, &y) in h.iter().enumerate() {
        let (x, z) = ((i % GRID) as f32 * SPACING, (i / GRID) as f32 * SPACING);
        points.extend_from_slice(&[x, y, z]);
        let t = ((y + 10.0) / 20.0).clamp(0.0, 1.0);
        colors.extend_from_slice(&[0.2 + 0.6 * t, 0.6 - 0.3 * t, 0.1]);
    }

    let mut indices = Vec::with_capacity((GRID - 1) * (GRID - 1) * 5);
    for z in 0..GRID - 1 {
        for x in 0..GRID - 1 {
            let i = (z * GRID + x) as i32;
            let g = GRID as i32;
            indices.extend_from_slice(&[i, i + 1, i + g + 1, i + g, -1]);
        }
    }

    SceneNode::new("X3D")
        .with_attribute("profile", "Interchange")
        .with_attribute("version", "3.3")
        .with_child(
            SceneNode::new("Scene").with_child(
                SceneNode::new("Transform")
                    .with_attribute("DEF", "Terrain")
                    .with_child(
                        SceneNode::new("Shape").with_child(
                            SceneNode::new("IndexedFaceSet")
                                .with_attribute("solid", false)
                                .with_attribute("colorPerVertex", true)
                                .with_attribute("coordIndex", TypedArray::Int32(indices))
                                .with_child(
                                    SceneNode::new("Coordinate")
                                        .with_attribute("point", TypedArray::Float32(points)),
                                )
                                .with_child(
                                    SceneNode::new("Color").with_attribute("color", TypedArray::Float32(colors)),
                                ),
                        ),
                    ),
            ),
        )
}

// ── text baseline ───────────────────────────────────────────────────────────

fn to_xml(node: &SceneNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}<{}", node.element);
    for attr in &node.attributes {
        let _ = write!(out, " {}='", attr.name);
        match &attr.value {
            AttributeValue::Text(s) => out.push_str(s),
            AttributeValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            AttributeValue::Array(TypedArray::Int32(v)) => {
                for n in v {
                    let _ = write!(out, "{n} ");
                }
            }
            AttributeValue::Array(TypedArray::Float32(v)) => {
                for n in v {
                    let _ = write!(out, "{n} ");
                }
            }
        }
        out.push('\'');
    }
    if node.children.is_empty() && node.text.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");
    out.push_str(&node.text);
    for child in &node.children {
        to_xml(child, depth + 1, out);
    }
    let _ = writeln!(out, "{indent}</{}>", node.element);
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::new(), GzCompression::best());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}

// ── reporting ───────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const U: &[&str] = &["B", "KB", "MB", "GB"];
    let mut v = n as f64;
    let mut u = 0;
    while v >= 1024.0 && u < U.len() - 1 { v /= 1024.0; u += 1; }
    if u == 0 { format!("{n} B") } else { format!("{v:.2} {}", U[u]) }
}

fn fmt_duration(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms < 1.0 {
        format!("{:.1} µs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{ms:.1} ms")
    } else {
        format!("{:.2} s", d.as_secs_f64())
    }
}

/// Largest absolute difference between corresponding float arrays of two trees.
fn max_float_error(a: &SceneNode, b: &SceneNode) -> f64 {
    let mut worst = 0.0f64;
    for (x, y) in a.walk().zip(b.walk()) {
        for (ax, bx) in x.attributes.iter().zip(&y.attributes) {
            if let (
                AttributeValue::Array(TypedArray::Float32(u)),
                AttributeValue::Array(TypedArray::Float32(v)),
            ) = (&ax.value, &bx.value)
            {
                for (p, q) in u.iter().zip(v) {
                    worst = worst.max((f64::from(*p) - f64::from(*q)).abs());
                }
            }
        }
    }
    worst
}

// ── main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    println!("=== X3DB demo: {GRID}x{GRID} terrain ===");
    println!();

    let scene = terrain_scene();
    let mut xml = String::new();
    to_xml(&scene, 0, &mut xml);

    let t0 = Instant::now();
    let gz = gzip(xml.as_bytes())?;
    let gz_time = t0.elapsed();

    println!("  {:<22}  {:>12}  {:>10}", "format", "size", "time");
    println!("  {}", "-".repeat(48));
    println!("  {:<22}  {:>12}  {:>10}", "X3D text", human_bytes(xml.len() as u64), "-");
    println!(
        "  {:<22}  {:>12}  {:>10}",
        "X3D text + gzip -9",
        human_bytes(gz.len() as u64),
        fmt_duration(gz_time)
    );

    let mut smallest = u64::MAX;
    for &tolerance in TOLERANCES {
        let mut codec = ContainerCodec::initialized(ContainerConfig {
            float_tolerance: tolerance,
            ..ContainerConfig::default()
        })?;

        let t = Instant::now();
        let bytes = codec.encode_scene(&scene, Vec::new())?;
        let encode_time = t.elapsed();

        let t = Instant::now();
        let decoded = codec.decode_scene(bytes.as_slice(), None)?;
        let decode_time = t.elapsed();

        let error = max_float_error(&scene, &decoded);
        if error > f64::from(tolerance) {
            bail!("tolerance {tolerance:e} exceeded: max error {error:e}");
        }
        smallest = smallest.min(bytes.len() as u64);
        println!(
            "  {:<22}  {:>12}  {:>10}   decode {:>9}   max error {:.3e}",
            format!("X3DB t={tolerance:e}"),
            human_bytes(bytes.len() as u64),
            fmt_duration(encode_time),
            fmt_duration(decode_time),
            error
        );
    }

    println!();
    println!(
        "  best X3DB is {:.1}x smaller than gzip'd text",
        gz.len() as f64 / smallest.max(1) as f64
    );
    Ok(())
}

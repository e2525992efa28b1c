//! `garuda golden`: evaluate the golden model for one operand vector.

use garuda_config::validate_config;
use garuda_dv::operand::{mask, signed_range, to_pattern};
use garuda_dv::{GoldenModel, OperandVector};
use serde_json::json;

use crate::{GlobalArgs, GoldenArgs, ReportFormat};

/// Runs the `garuda golden` command. Always exits 0 on success.
pub fn run(args: &GoldenArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = global.load_config()?;
    if let Some(xlen) = args.xlen {
        config.dut.xlen = xlen;
    }
    if let Some(mode) = args.mac8_acc {
        config.regression.mac8_acc = mode.into();
    }
    validate_config(&config)?;

    let width = config.dut.xlen;
    let rs1 = parse_operand(&args.rs1, width)?;
    let rs2 = parse_operand(&args.rs2, width)?;
    let acc = parse_operand(&args.acc, width)?;
    let vector = OperandVector::from_patterns(args.opcode, rs1, rs2, acc, width);

    let golden = GoldenModel::new(width).with_mac8_acc(config.regression.mac8_acc);
    let expected = golden.compute(&vector);

    match args.format {
        ReportFormat::Json => {
            let out = json!({
                "xlen": width,
                "vector": vector,
                "expected": expected,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        ReportFormat::Text => {
            println!("{}", vector.describe(width));
            match expected {
                Some(e) => println!(
                    "  result:   {} (0x{:0digits$x}) valid={}",
                    e.value,
                    to_pattern(e.value, width),
                    u8::from(e.valid),
                    digits = width.div_ceil(4) as usize,
                ),
                None => println!("  result:   no golden value for {}", vector.opcode),
            }
        }
    }
    Ok(0)
}

/// Parses an operand as `0x` hex bit pattern or signed decimal.
///
/// The value must be representable in `width` bits: a hex pattern must fit
/// unsigned, a decimal value must fit the signed range.
fn parse_operand(text: &str, width: u32) -> Result<u64, String> {
    let t = text.trim().replace('_', "");
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        let value = u64::from_str_radix(hex, 16)
            .map_err(|e| format!("invalid hex operand '{text}': {e}"))?;
        if value & !mask(width) != 0 {
            return Err(format!("operand '{text}' does not fit in {width} bits"));
        }
        return Ok(value);
    }
    let value: i64 = t
        .parse()
        .map_err(|e| format!("invalid operand '{text}': {e}"))?;
    let (min, max) = signed_range(width);
    if value < min || value > max {
        return Err(format!(
            "operand {value} outside the signed {width}-bit range {min}..={max}"
        ));
    }
    Ok(to_pattern(value, width))
}

//! Net-name role classification.
//!
//! Nets get their `is_ground`/`is_positive_power` flags from
//! conventional naming at normalization time. The lists below cover the
//! usual schematic vocabulary (GND/VSS families, VCC/VDD families and
//! voltage-valued names like `3V3` or `+5V`).

/// True for ground-style net names: GND, AGND, DGND, VSS, VEE, 0V, ...
pub fn is_ground_name(name: &str) -> bool {
    let upper = name.trim().trim_start_matches(['+', '-']).to_uppercase();
    matches!(
        upper.as_str(),
        "GND" | "AGND" | "DGND" | "PGND" | "SGND" | "GROUND" | "VSS" | "VEE" | "0V" | "EARTH"
    )
}

/// True for positive-supply-style net names: VCC, VDD, VBUS, VIN,
/// 3V3/5V/12V-style voltage names, ...
pub fn is_positive_power_name(name: &str) -> bool {
    let trimmed = name.trim();
    if is_ground_name(trimmed) {
        return false;
    }
    let upper = trimmed.trim_start_matches('+').to_uppercase();
    if matches!(
        upper.as_str(),
        "VCC" | "VDD" | "VDDA" | "VDDIO" | "VBUS" | "VIN" | "VBAT" | "VSUP" | "PWR" | "POWER"
    ) {
        return true;
    }
    if upper.starts_with("VCC") || upper.starts_with("VDD") {
        return true;
    }
    looks_like_voltage(&upper)
}

/// Matches "3V3", "5V", "1V8", "12V", "3.3V" style names.
fn looks_like_voltage(upper: &str) -> bool {
    let bytes = upper.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_digit() {
        return false;
    }
    if !upper.contains('V') {
        return false;
    }
    upper
        .chars()
        .all(|c| c.is_ascii_digit() || c == 'V' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_names() {
        for name in ["GND", "gnd", "AGND", "DGND", "VSS", "0V", "+GND"] {
            assert!(is_ground_name(name), "{name} should classify as ground");
        }
        assert!(!is_ground_name("VCC"));
        assert!(!is_ground_name("SIGNAL"));
    }

    #[test]
    fn power_names() {
        for name in ["VCC", "vdd", "VDDA", "+5V", "3V3", "1V8", "3.3V", "VBUS", "VCC_IO"] {
            assert!(
                is_positive_power_name(name),
                "{name} should classify as positive power"
            );
        }
        assert!(!is_positive_power_name("GND"));
        assert!(!is_positive_power_name("SDA"));
        assert!(!is_positive_power_name("V")); // no digits, not a rail
    }
}

use super::*;

fn line(quantity: f64, unit_price: f64, tax_rate: f64, discount_percent: f64) -> NewLineItem {
    NewLineItem {
        product_id: None,
        sku: String::new(),
        name: "Item".to_string(),
        quantity,
        unit_price,
        tax_rate,
        discount_percent,
        position: 0,
    }
}

#[test]
fn test_to_decimal_precision() {
    // Classic floating point problem: 0.1 + 0.2 != 0.3
    let a = 0.1_f64;
    let b = 0.2_f64;
    let sum_f64 = a + b;

    // f64 fails
    assert_ne!(sum_f64, 0.3);

    // Decimal succeeds
    let sum_dec = to_decimal(a) + to_decimal(b);
    assert_eq!(to_f64(sum_dec), 0.3);
}

#[test]
fn test_accumulation_precision() {
    // Sum 0.01 one thousand times
    let mut total = Decimal::ZERO;
    for _ in 0..1000 {
        total += to_decimal(0.01);
    }
    assert_eq!(to_f64(total), 10.0);
}

#[test]
fn test_line_net_no_discount() {
    let l = line(3.0, 10.99, 19.0, 0.0);
    assert_eq!(to_f64(line_net(&l)), 32.97); // 10.99 * 3
}

#[test]
fn test_line_net_with_tricky_discount() {
    let l = line(1.0, 100.0, 19.0, 33.33);
    assert_eq!(to_f64(line_net(&l)), 66.67); // 100 - 33.33
}

#[test]
fn test_line_gross_applies_tax_rate() {
    let l = line(2.0, 10.0, 19.0, 0.0);
    assert_eq!(to_f64(line_net(&l)), 20.0);
    assert_eq!(to_f64(line_gross(&l)), 23.8); // 20.00 * 1.19
}

#[test]
fn test_non_finite_defaults_to_zero() {
    assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
}

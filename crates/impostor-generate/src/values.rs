use fake::Fake;
use fake::faker::address::en::{BuildingNumber, StreetName};
use fake::faker::lorem::en::{Paragraph, Word};
use impostor_core::CountRange;
use rand::Rng;
use serde_json::Value;

const PARAGRAPH_SENTENCES: std::ops::Range<usize> = 3..7;

/// Uniform float in `[min, max)`; a degenerate range yields `min`.
pub fn within_range<R: Rng + ?Sized>(rng: &mut R, range: CountRange) -> f64 {
    if range.max() <= range.min() {
        return range.min();
    }
    rng.random::<f64>() * (range.max() - range.min()) + range.min()
}

/// Floored draw from `range`, clamped at zero.
pub fn count_within<R: Rng + ?Sized>(rng: &mut R, range: CountRange) -> usize {
    within_range(rng, range).floor().max(0.0) as usize
}

/// UUIDv4 built from the caller's generator so runs stay reproducible.
pub fn uuid_v4<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.random();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

pub fn words<R: Rng + ?Sized>(rng: &mut R, range: CountRange) -> String {
    let count = count_within(rng, range);
    let words: Vec<String> = (0..count)
        .map(|_| Word().fake_with_rng::<String, _>(rng))
        .collect();
    words.join(" ")
}

pub fn paragraph<R: Rng + ?Sized>(rng: &mut R) -> String {
    Paragraph(PARAGRAPH_SENTENCES).fake_with_rng(rng)
}

pub fn address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let number: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    format!("{number} {street}")
}

/// Amount in `range`, rounded to cents.
pub fn currency<R: Rng + ?Sized>(rng: &mut R, range: CountRange) -> f64 {
    round_cents(within_range(rng, range))
}

/// Random walk: the first point is drawn from `initial`, every following
/// point moves the previous one by at most `variation` (relative).
pub fn curve<R: Rng + ?Sized>(
    rng: &mut R,
    num_of_points: usize,
    variation: f64,
    initial: CountRange,
) -> Vec<f64> {
    let step = CountRange::new(-variation.abs(), variation.abs());
    let mut points = Vec::with_capacity(num_of_points);
    let mut current = within_range(rng, initial);

    for _ in 0..num_of_points {
        points.push(round_cents(current));
        current *= 1.0 + within_range(rng, step);
    }

    points
}

/// Substitute every `{}` in `pattern` with the rendered value.
pub fn fill_template(pattern: &str, value: &Value) -> String {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    pattern.replace("{}", &text)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::*;

    #[test]
    fn degenerate_range_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(count_within(&mut rng, CountRange::exactly(3.0)), 3);
        assert_eq!(within_range(&mut rng, CountRange::new(5.0, 5.0)), 5.0);
    }

    #[test]
    fn counts_stay_inside_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let count = count_within(&mut rng, CountRange::new(2.0, 5.0));
            assert!((2..5).contains(&count), "count {count} out of range");
        }
    }

    #[test]
    fn words_respects_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let phrase = words(&mut rng, CountRange::exactly(4.0));
        assert_eq!(phrase.split(' ').count(), 4);
    }

    #[test]
    fn uuid_is_v4_and_seeded() {
        let a = uuid_v4(&mut ChaCha8Rng::seed_from_u64(9));
        let b = uuid_v4(&mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
        let parsed = uuid::Uuid::parse_str(&a).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn curve_has_requested_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let points = curve(&mut rng, 450, 0.001, CountRange::new(5.0, 1000.0));
        assert_eq!(points.len(), 450);
        assert!(points.iter().all(|point| *point > 0.0));
    }

    #[test]
    fn template_renders_strings_and_numbers() {
        assert_eq!(
            fill_template("https://img.example.com/{}.png", &json!("shoe")),
            "https://img.example.com/shoe.png"
        );
        assert_eq!(fill_template("#{}", &json!(12)), "#12");
    }
}

use routesketch_shared::FeatureId;

pub const FEATURE_ID_LEN: usize = 16;

pub trait IdSource {
    fn next_id(&mut self) -> FeatureId;
}

// MapLibre turns digit-only ids into JS numbers. A leading 1..=8 keeps every
// id free of leading zeros and below 2^53, so the number reads back unchanged.
pub struct RandomIds {
    random: Box<dyn FnMut() -> f64>,
}

impl RandomIds {
    pub fn new(random: impl FnMut() -> f64 + 'static) -> Self {
        Self {
            random: Box::new(random),
        }
    }

    pub fn browser() -> Self {
        Self::new(js_sys::Math::random)
    }

    fn digit(&mut self, low: u32, high: u32) -> char {
        let span = f64::from(high - low + 1);
        let offset = ((self.random)() * span) as u32;
        char::from_digit(low + offset.min(high - low), 10).unwrap_or('1')
    }
}

impl IdSource for RandomIds {
    fn next_id(&mut self) -> FeatureId {
        let mut id = String::with_capacity(FEATURE_ID_LEN);
        id.push(self.digit(1, 8));
        for _ in 1..FEATURE_ID_LEN {
            id.push(self.digit(0, 9));
        }
        FeatureId::new(id)
    }
}

pub fn id_from_number(value: f64) -> Option<FeatureId> {
    value
        .is_finite()
        .then(|| FeatureId::new(format!("{value:.0}")))
}

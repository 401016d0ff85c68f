//! Static model capacity table.

/// Maximum total tokens (input plus output) per supported model.
const MODEL_CAPACITY: &[(&str, usize)] = &[
    ("gpt-3.5-turbo", 4096),
    ("gpt-3.5-turbo-16k", 16_384),
    ("gpt-4", 8192),
    ("gpt-4-32k", 32_768),
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
];

/// Look up a model's total token capacity. Names match exactly.
pub fn max_model_tokens(model: &str) -> Option<usize> {
    MODEL_CAPACITY
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, tokens)| *tokens)
}

/// Models present in the capacity table.
pub fn known_models() -> impl Iterator<Item = &'static str> {
    MODEL_CAPACITY.iter().map(|(name, _)| *name)
}

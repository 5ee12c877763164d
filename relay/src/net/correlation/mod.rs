pub mod correlation_token;
pub mod random_correlation_token_generator;

// Template upload API: accepts a template file and returns its analysis plus derived styling.

pub mod handlers;

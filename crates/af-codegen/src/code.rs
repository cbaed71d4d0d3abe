//! Generated statements plus the variables they reference.

/// Accumulated code text and the ordered, duplicate-free list of variable
/// names it reads or assigns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeAndVarNames {
    code: String,
    var_names: Vec<String>,
}

impl CodeAndVarNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.var_names.is_empty()
    }

    pub fn append_code(&mut self, code: &str) {
        self.code.push_str(code);
    }

    /// Record a variable name; repeats are ignored.
    pub fn add_var_name(&mut self, name: &str) {
        if !self.var_names.iter().any(|n| n == name) {
            self.var_names.push(name.to_string());
        }
    }

    /// Append another accumulator's code and merge its names.
    pub fn append(&mut self, other: &CodeAndVarNames) {
        self.append_code(&other.code);
        for name in &other.var_names {
            self.add_var_name(name);
        }
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.code, self.var_names)
    }
}

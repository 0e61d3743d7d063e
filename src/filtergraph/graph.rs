use std::fmt;

use crate::filtergraph::escape::escape_value;

/// One filter with ordered `key=value` options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    name: &'static str,
    options: Vec<(&'static str, String)>,
}

impl Filter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            options: Vec::new(),
        }
    }

    /// Append an option. The value is stored raw and escaped on lowering.
    pub fn opt(mut self, key: &'static str, value: impl ToString) -> Self {
        self.options.push((key, value.to_string()));
        self
    }

    /// Replace an existing option or append it.
    pub fn set(&mut self, key: &'static str, value: impl ToString) {
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.options.push((key, value.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw (unescaped) value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for (i, (key, value)) in self.options.iter().enumerate() {
            let sep = if i == 0 { '=' } else { ':' };
            write!(f, "{sep}{key}={}", escape_value(value))?;
        }
        Ok(())
    }
}

/// Linear chain of filters between labelled pads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<String>,
}

impl FilterChain {
    pub fn new(inputs: &[impl AsRef<str>], outputs: &[impl AsRef<str>]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.as_ref().to_string()).collect(),
            filters: Vec::new(),
            outputs: outputs.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn then(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "[{pad}]")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for pad in &self.outputs {
            write!(f, "[{pad}]")?;
        }
        Ok(())
    }
}

/// A complete `-filter_complex` graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterGraph {
    pub chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    /// Every filter in graph order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.chains.iter().flat_map(|c| c.filters.iter())
    }

    /// Mutable access to every filter named `name`.
    pub fn filters_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Filter> + 'a {
        self.chains
            .iter_mut()
            .flat_map(|c| c.filters.iter_mut())
            .filter(move |f| f.name == name)
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{chain}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filtergraph/graph.rs"]
mod tests;

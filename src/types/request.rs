/// The parts of the HTTP request head the interpreter reads and rewrites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub url: String,
    /// Raw header lines, `Name: value`, in arrival order.
    pub headers: Vec<String>,
    /// Redirect target set by the redirect action.
    pub redirect: Option<String>,
}

impl RequestHead {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_owned(),
            url: url.to_owned(),
            ..Self::default()
        }
    }

    /// Append a raw header line.
    #[must_use]
    pub fn header(mut self, line: &str) -> Self {
        self.headers.push(line.to_owned());
        self
    }

    /// Value of the first header called `name`, ignoring ASCII case.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    #[must_use]
    pub fn referer(&self) -> &str {
        self.header_value("referer").unwrap_or_default()
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.header_value("user-agent").unwrap_or_default()
    }

    #[must_use]
    pub fn is_method(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }

    pub(crate) fn add_header(&mut self, line: &str) {
        self.headers.push(line.trim_end_matches(['\r', '\n']).to_owned());
    }
}

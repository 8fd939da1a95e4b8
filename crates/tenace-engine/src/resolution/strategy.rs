//! Locating strategies and the builders that turn attribute hints into
//! ready-made, ordered strategy lists.

use crate::driver::{Driver, DriverError, ElementHandle};

/// How a strategy finds its candidate targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// `id` attribute.
    Id(String),
    /// `name` attribute.
    Name(String),
    /// Visible text, whole-string match after whitespace normalization.
    Text(String),
    /// Visible text containing the given fragment.
    TextContains(String),
    /// Accessible label (`aria-label`, associated `<label>`, placeholder).
    Label(String),
    /// Semantic role, optionally narrowed by accessible name.
    Role { role: String, name: Option<String> },
    /// `data-testid` attribute.
    TestId(String),
    /// Raw CSS selector.
    Css(String),
    /// Raw XPath expression.
    XPath(String),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id={}", v),
            Locator::Name(v) => write!(f, "name={}", v),
            Locator::Text(v) => write!(f, "text={:?}", v),
            Locator::TextContains(v) => write!(f, "text*={:?}", v),
            Locator::Label(v) => write!(f, "label={:?}", v),
            Locator::Role { role, name: None } => write!(f, "role={}", role),
            Locator::Role {
                role,
                name: Some(name),
            } => write!(f, "role={}[name={:?}]", role, name),
            Locator::TestId(v) => write!(f, "testid={}", v),
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::XPath(v) => write!(f, "xpath={}", v),
        }
    }
}

/// A named way of locating a target. The name is only a diagnostic label;
/// it is what gets reported when the strategy wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub name: String,
    pub locator: Locator,
}

impl Strategy {
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
        }
    }

    /// Resolve the candidate targets for this strategy against the live page.
    pub async fn resolve<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<Vec<ElementHandle>, DriverError> {
        driver.query(&self.locator).await
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(format!("id:{}", id), Locator::Id(id))
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(format!("name:{}", name), Locator::Name(name))
    }

    pub fn by_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(format!("text:{}", text), Locator::Text(text))
    }

    pub fn by_text_contains(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(format!("text-contains:{}", text), Locator::TextContains(text))
    }

    pub fn by_label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(format!("label:{}", label), Locator::Label(label))
    }

    pub fn by_role(role: impl Into<String>, name: Option<String>) -> Self {
        let role = role.into();
        let label = match &name {
            Some(n) => format!("role:{}:{}", role, n),
            None => format!("role:{}", role),
        };
        Self::new(label, Locator::Role { role, name })
    }

    pub fn by_test_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(format!("testid:{}", id), Locator::TestId(id))
    }

    pub fn by_css(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::new(format!("css:{}", selector), Locator::Css(selector))
    }

    pub fn by_xpath(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(format!("xpath:{}", path), Locator::XPath(path))
    }
}

/// Attribute hints known about a target. Every field set becomes one
/// strategy; the expansion order puts the most drift-resistant hints first.
#[derive(Debug, Clone, Default)]
pub struct TargetHints {
    pub test_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub role: Option<String>,
    pub text: Option<String>,
    pub text_contains: Option<String>,
    pub css: Option<String>,
    pub xpath: Option<String>,
}

impl TargetHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn test_id(mut self, v: impl Into<String>) -> Self {
        self.test_id = Some(v.into());
        self
    }

    pub fn id(mut self, v: impl Into<String>) -> Self {
        self.id = Some(v.into());
        self
    }

    pub fn name(mut self, v: impl Into<String>) -> Self {
        self.name = Some(v.into());
        self
    }

    pub fn label(mut self, v: impl Into<String>) -> Self {
        self.label = Some(v.into());
        self
    }

    pub fn role(mut self, v: impl Into<String>) -> Self {
        self.role = Some(v.into());
        self
    }

    pub fn text(mut self, v: impl Into<String>) -> Self {
        self.text = Some(v.into());
        self
    }

    pub fn text_contains(mut self, v: impl Into<String>) -> Self {
        self.text_contains = Some(v.into());
        self
    }

    pub fn css(mut self, v: impl Into<String>) -> Self {
        self.css = Some(v.into());
        self
    }

    pub fn xpath(mut self, v: impl Into<String>) -> Self {
        self.xpath = Some(v.into());
        self
    }

    /// Expand the hints into an ordered strategy list.
    ///
    /// A role hint is narrowed by the label or exact text when one is
    /// present, since a bare role usually matches many elements.
    pub fn strategies(&self) -> Vec<Strategy> {
        let mut out = Vec::new();

        if let Some(v) = &self.test_id {
            out.push(Strategy::by_test_id(v));
        }
        if let Some(v) = &self.id {
            out.push(Strategy::by_id(v));
        }
        if let Some(v) = &self.name {
            out.push(Strategy::by_name(v));
        }
        if let Some(v) = &self.label {
            out.push(Strategy::by_label(v));
        }
        if let Some(role) = &self.role {
            let accessible_name = self.label.clone().or_else(|| self.text.clone());
            out.push(Strategy::by_role(role, accessible_name));
        }
        if let Some(v) = &self.text {
            out.push(Strategy::by_text(v));
        }
        if let Some(v) = &self.text_contains {
            out.push(Strategy::by_text_contains(v));
        }
        if let Some(v) = &self.css {
            out.push(Strategy::by_css(v));
        }
        if let Some(v) = &self.xpath {
            out.push(Strategy::by_xpath(v));
        }

        out
    }
}

// scraper/form.rs
use crate::scraper::ScraperError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// The single server-side form of an ASP.NET WebForms page.
///
/// Holds every successful control (hidden view state included) as ordered
/// name/value pairs so a post-back looks like the one a browser would send.
#[derive(Debug, Clone)]
pub struct AspNetForm {
    pub action: Url,
    fields: Vec<(String, String)>,
    /// id -> name, for every input/select/textarea on the page.
    ids: Vec<(String, String)>,
    /// select id -> (value, text) options.
    options: Vec<(String, Vec<(String, String)>)>,
    /// submit-button id -> (name, value). Buttons are not sent unless clicked.
    buttons: Vec<(String, (String, String))>,
    /// checkbox/radio id -> (name, value), checked or not.
    checkables: Vec<(String, (String, String))>,
}

fn sel(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(e.to_string()))
}

fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

impl AspNetForm {
    /// Parses the form that contains `#{anchor_id}`, or the first form when
    /// no anchor is given.
    pub fn parse(html: &str, page_url: &Url, anchor_id: Option<&str>) -> Result<Self, ScraperError> {
        let doc = Html::parse_document(html);
        let form_sel = sel("form")?;

        let form = match anchor_id {
            Some(id) => {
                let inner = sel(&format!("#{id}"))?;
                doc.select(&form_sel)
                    .find(|f| f.select(&inner).next().is_some())
                    .ok_or_else(|| ScraperError::ElementMissing(id.to_string()))?
            }
            None => doc
                .select(&form_sel)
                .next()
                .ok_or_else(|| ScraperError::ElementMissing("form".into()))?,
        };

        let action = match attr(&form, "action") {
            Some(a) if !a.is_empty() => page_url
                .join(a)
                .map_err(|e| ScraperError::HtmlParse(format!("bad form action {a}: {e}")))?,
            _ => page_url.clone(),
        };

        let mut out = AspNetForm {
            action,
            fields: Vec::new(),
            ids: Vec::new(),
            options: Vec::new(),
            buttons: Vec::new(),
            checkables: Vec::new(),
        };

        for input in form.select(&sel("input")?) {
            let Some(name) = attr(&input, "name") else { continue };
            let value = attr(&input, "value").unwrap_or("").to_string();
            if let Some(id) = attr(&input, "id") {
                out.ids.push((id.to_string(), name.to_string()));
            }

            match attr(&input, "type").unwrap_or("text").to_ascii_lowercase().as_str() {
                "submit" | "image" | "button" => {
                    if let Some(id) = attr(&input, "id") {
                        out.buttons
                            .push((id.to_string(), (name.to_string(), value)));
                    }
                }
                "checkbox" | "radio" => {
                    let v = if value.is_empty() { "on".to_string() } else { value };
                    if let Some(id) = attr(&input, "id") {
                        out.checkables
                            .push((id.to_string(), (name.to_string(), v.clone())));
                    }
                    if attr(&input, "checked").is_some() {
                        out.fields.push((name.to_string(), v));
                    }
                }
                _ => out.fields.push((name.to_string(), value)),
            }
        }

        let option_sel = sel("option")?;
        for select in form.select(&sel("select")?) {
            let Some(name) = attr(&select, "name") else { continue };
            let multiple = attr(&select, "multiple").is_some();
            let mut opts = Vec::new();
            let mut selected = Vec::new();

            for opt in select.select(&option_sel) {
                let text = opt.text().collect::<String>().trim().to_string();
                let value = attr(&opt, "value").map(str::to_string).unwrap_or_else(|| text.clone());
                if attr(&opt, "selected").is_some() {
                    selected.push(value.clone());
                }
                opts.push((value, text));
            }
            // A single select without an explicit choice submits its first option.
            if selected.is_empty() && !multiple {
                if let Some((v, _)) = opts.first() {
                    selected.push(v.clone());
                }
            }
            for v in selected {
                out.fields.push((name.to_string(), v));
            }

            if let Some(id) = attr(&select, "id") {
                out.ids.push((id.to_string(), name.to_string()));
                out.options.push((id.to_string(), opts));
            }
        }

        Ok(out)
    }

    pub fn name_of(&self, id: &str) -> Result<&str, ScraperError> {
        self.ids
            .iter()
            .find(|(i, _)| i == id)
            .map(|(_, n)| n.as_str())
            .ok_or_else(|| ScraperError::ElementMissing(id.to_string()))
    }

    pub fn has_element(&self, id: &str) -> bool {
        self.ids.iter().any(|(i, _)| i == id)
    }

    /// (value, text) pairs of the select with this id.
    pub fn options(&self, select_id: &str) -> Result<&[(String, String)], ScraperError> {
        self.options
            .iter()
            .find(|(i, _)| i == select_id)
            .map(|(_, o)| o.as_slice())
            .ok_or_else(|| ScraperError::ElementMissing(select_id.to_string()))
    }

    pub fn offers(&self, select_id: &str, value: &str) -> bool {
        self.options(select_id)
            .map(|opts| opts.iter().any(|(v, _)| v == value))
            .unwrap_or(false)
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        let name = self.name_of(id).ok()?;
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces whatever the control with this id currently submits.
    pub fn set(&mut self, id: &str, value: &str) -> Result<(), ScraperError> {
        self.set_all(id, &[value])
    }

    pub fn set_all(&mut self, id: &str, values: &[&str]) -> Result<(), ScraperError> {
        let name = self.name_of(id)?.to_string();
        self.fields.retain(|(n, _)| *n != name);
        for v in values {
            self.fields.push((name.clone(), v.to_string()));
        }
        Ok(())
    }

    /// Checks a checkbox, or selects a radio button within its group.
    pub fn check(&mut self, id: &str) -> Result<(), ScraperError> {
        let (name, value) = self
            .checkables
            .iter()
            .find(|(i, _)| i == id)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| ScraperError::ElementMissing(id.to_string()))?;
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, value));
        Ok(())
    }

    /// Unchecks a checkbox (or empties any control).
    pub fn clear(&mut self, id: &str) -> Result<(), ScraperError> {
        let name = self.name_of(id)?.to_string();
        self.fields.retain(|(n, _)| *n != name);
        Ok(())
    }

    /// Name/value pairs to post, as if the button with this id was clicked.
    pub fn submission(&self, button_id: &str) -> Result<Vec<(String, String)>, ScraperError> {
        let (name, value) = self
            .buttons
            .iter()
            .find(|(i, _)| i == button_id)
            .map(|(_, b)| b.clone())
            .ok_or_else(|| ScraperError::ElementMissing(button_id.to_string()))?;

        let mut out = self.fields.clone();
        out.push((name, value));
        Ok(out)
    }

    /// Post-back without a button (login forms submitted from a field).
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// First `href` of the element matching `css`, resolved against the page.
pub fn find_link(html: &str, page_url: &Url, css: &str) -> Result<Url, ScraperError> {
    let doc = Html::parse_document(html);
    let href = doc
        .select(&sel(css)?)
        .find_map(|a| a.value().attr("href"))
        .ok_or_else(|| ScraperError::ElementMissing(css.to_string()))?;
    page_url
        .join(href)
        .map_err(|e| ScraperError::HtmlParse(format!("bad link {href}: {e}")))
}

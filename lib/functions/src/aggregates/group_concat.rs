use crate::aggregates::Accumulator;
use crate::value::{string_term, StringLiteralRef};
use rdf_eval_model::{Term, ThinError, ThinResult};

/// `GROUP_CONCAT(expr; SEPARATOR=...)` concatenates string values.
///
/// The language tag is kept if all values share the same language tag.
pub struct GroupConcatAccumulator {
    separator: String,
    result: ThinResult<String>,
    language: Option<Option<String>>,
}

impl GroupConcatAccumulator {
    pub fn new(separator: &str) -> Self {
        Self {
            separator: separator.to_owned(),
            result: Ok(String::new()),
            language: None,
        }
    }
}

impl Accumulator for GroupConcatAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        let Ok(result) = &mut self.result else {
            return;
        };
        let value = match &value {
            Ok(value) => StringLiteralRef::try_from_term(value),
            Err(error) => Err(*error),
        };
        match value {
            Ok(StringLiteralRef(value, language)) => {
                if self.language.is_some() {
                    result.push_str(&self.separator);
                }
                result.push_str(value);
                self.language = match self.language.take() {
                    None => Some(language.map(str::to_owned)),
                    Some(current) if current.as_deref() == language => Some(current),
                    Some(_) => Some(None),
                };
            }
            Err(error) => self.result = Err(error),
        }
    }

    fn evaluate(&self) -> ThinResult<Term> {
        match &self.result {
            Ok(result) => Ok(string_term(
                result.as_str(),
                self.language.as_ref().and_then(Option::as_deref),
            )),
            Err(_) => ThinError::expected(),
        }
    }
}

use crate::chat::{ChatMessage, CompletionClient, Transcript};
use crate::config::AppConfig;
use crate::error::CompletionError;
use crate::geo::{GeoService, NominatimClient};
use crate::pricing::PriceModelService;

/// Number of earlier turns sent along with each new question.
pub const HISTORY_TURNS: usize = 2;

/// Everything that lives for one interactive session: the chat transcript,
/// the chat input key and the service caches. Dropped at exit.
pub struct Session {
    pub transcript: Transcript,
    /// Bumped whenever the chat input should be reset.
    pub input_key: u64,
    pub price_model: PriceModelService,
    pub geo: GeoService,
}

impl Session {
    pub fn new(price_model: PriceModelService, geo: GeoService) -> Self {
        Self {
            transcript: Transcript::default(),
            input_key: 0,
            price_model,
            geo,
        }
    }

    /// Build both services from configuration. A geocoder that cannot be
    /// constructed leaves the geo service on its static fallbacks.
    pub fn from_config(config: &AppConfig) -> Self {
        let geocoder = match NominatimClient::new(&config.geocoder_url, config.geocoder_timeout) {
            Ok(client) => Some(Box::new(client) as Box<dyn crate::geo::Geocoder>),
            Err(err) => {
                log::warn!("Geocoder unavailable, using static locations: {err}");
                None
            }
        };
        Self::new(
            PriceModelService::new(&config.model_path),
            GeoService::new(geocoder),
        )
    }

    /// Record `question`, ask the model with the preceding turns, record the
    /// reply. On failure the question stays in the transcript.
    pub fn ask(&mut self, client: &CompletionClient, question: &str) -> Result<&ChatMessage, CompletionError> {
        let history = self.transcript.recent(HISTORY_TURNS).to_vec();
        self.transcript.push(ChatMessage::user(question));

        let reply = client.complete(&history, question);
        self.input_key += 1;
        let text = reply.inspect_err(|err| log::warn!("Chat completion failed: {err}"))?;

        self.transcript
            .push(ChatMessage::assistant(text, client.source_label()));
        let last = self.transcript.len() - 1;
        Ok(&self.transcript.messages()[last])
    }

    /// Empty the transcript. Model and location caches are untouched.
    pub fn clear_chat(&mut self) {
        self.transcript.clear();
        self.input_key += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_bumps_input_key() {
        let mut session = Session::new(
            PriceModelService::new("unused.json"),
            GeoService::new(None),
        );
        session.transcript.push(ChatMessage::user("hello"));
        session.clear_chat();
        assert!(session.transcript.is_empty());
        assert_eq!(session.input_key, 1);
    }
}

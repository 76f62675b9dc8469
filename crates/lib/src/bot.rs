//! Activity handling: welcome new members, answer help, otherwise detect the target language
//! and reply with the translation.
//!
//! A [`TurnContext`] wraps one inbound activity and the transport replies go through. Transport
//! failures propagate to the caller; translation failures become chat replies.

use crate::activity::{Activity, ActivityType, InvokeResponse, Reply};
use crate::channels::{ActivityTransport, TransportError};
use crate::language::{target_language, Language};
use crate::translator::{Translate, TranslateError, Translation};
use serde_json::json;
use std::sync::Arc;

pub const EMPTY_TEXT_PROMPT: &str = "Please send some text to translate!";

/// Trimmed, lower-cased messages that show [`HELP_TEXT`].
pub const HELP_KEYWORDS: &[&str] = &["/help", "help", "/translate help"];

pub const HELP_TEXT: &str = "**Translation Bot Help**

Simply type any text in English or Sinhala, and I'll translate it for you!

**Examples:**
- Type: \"Hello, how are you?\" → Gets translated to Sinhala
- Type: \"ඔබට කොහොමද?\" → Gets translated to English

**Commands:**
- `/help` or `help` - Show this help message
- Just type any text - Auto-detects language and translates

**Supported Languages:**
- English ↔ Sinhala";

pub const WELCOME_TEXT: &str = "👋 **Welcome to Translation Bot!**

I can translate between English and Sinhala instantly!

Just type any text and I'll automatically detect the language and translate it for you.

Type `/help` for more information.";

/// True if `text` (already trimmed) is a help command.
pub fn is_help_command(text: &str) -> bool {
    let lower = text.to_lowercase();
    HELP_KEYWORDS.iter().any(|k| *k == lower)
}

/// Chat reply for a translation attempt. Never fails: errors are rendered for the user.
pub fn format_translation(result: &Result<Translation, TranslateError>, target: Language) -> String {
    match result {
        Ok(t) => format!(
            "**Translated** ({} → {}):\n{}",
            t.detected_language.as_deref().unwrap_or("unknown"),
            target.code(),
            t.text
        ),
        Err(e) => format!("Sorry, translation failed: {}", e),
    }
}

/// One turn: the inbound activity plus where replies go.
///
/// When the inbound activity asks for `expectReplies`, replies are buffered and returned by
/// [`TurnContext::into_invoke_response`]; otherwise each one is delivered as it is sent, using a
/// connector token fetched on the first delivery and reused for the rest of the turn.
pub struct TurnContext<'a> {
    transport: &'a dyn ActivityTransport,
    activity: &'a Activity,
    buffered: Vec<Activity>,
    token: Option<Option<String>>,
}

impl<'a> TurnContext<'a> {
    pub fn new(transport: &'a dyn ActivityTransport, activity: &'a Activity) -> Self {
        Self {
            transport,
            activity,
            buffered: Vec::new(),
            token: None,
        }
    }

    pub fn activity(&self) -> &'a Activity {
        self.activity
    }

    pub async fn send(&mut self, reply: Reply) -> Result<(), TransportError> {
        let outbound = self.transport.encode(self.activity, &reply);
        if self.activity.expects_replies() {
            self.buffered.push(outbound);
            Ok(())
        } else {
            if self.token.is_none() {
                self.token = Some(self.transport.connector_token(self.activity).await?);
            }
            let token = self.token.as_ref().and_then(|t| t.as_deref());
            self.transport.send(self.activity, &outbound, token).await
        }
    }

    /// Synchronous reply payload, present only for `expectReplies` turns.
    pub fn into_invoke_response(self) -> Option<InvokeResponse> {
        if self.activity.expects_replies() {
            Some(InvokeResponse {
                status: 200,
                body: json!({ "activities": self.buffered }),
            })
        } else {
            None
        }
    }
}

/// The translation bot. Holds no per-conversation state.
#[derive(Clone)]
pub struct TranslationBot {
    translator: Arc<dyn Translate>,
}

impl TranslationBot {
    pub fn new(translator: Arc<dyn Translate>) -> Self {
        Self { translator }
    }

    /// Dispatch on activity type.
    pub async fn on_turn(&self, ctx: &mut TurnContext<'_>) -> Result<(), TransportError> {
        match ctx.activity().typ {
            ActivityType::Message => self.on_message(ctx).await,
            ActivityType::ConversationUpdate => self.on_members_added(ctx).await,
            other => {
                log::debug!("ignoring {:?} activity", other);
                Ok(())
            }
        }
    }

    async fn on_message(&self, ctx: &mut TurnContext<'_>) -> Result<(), TransportError> {
        let text = ctx.activity().text().trim();
        if text.is_empty() {
            return ctx.send(Reply::text(EMPTY_TEXT_PROMPT)).await;
        }
        if is_help_command(text) {
            return ctx.send(Reply::text(HELP_TEXT)).await;
        }

        let target = target_language(text);
        log::debug!(
            "translating {} chars to {} for conversation {}",
            text.chars().count(),
            target,
            ctx.activity().conversation.id
        );
        ctx.send(Reply::Typing).await?;
        let result = self.translator.translate(text, target).await;
        ctx.send(Reply::Text(format_translation(&result, target))).await
    }

    /// Welcome every added member except the bot itself.
    async fn on_members_added(&self, ctx: &mut TurnContext<'_>) -> Result<(), TransportError> {
        let activity = ctx.activity();
        for member in &activity.members_added {
            if member.id != activity.recipient.id {
                ctx.send(Reply::text(WELCOME_TEXT)).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeTranslator {
        calls: AtomicUsize,
        last_target: Mutex<Option<Language>>,
        fail: bool,
    }

    impl FakeTranslator {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last_target: Mutex::new(None),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last_target: Mutex::new(None),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl Translate for FakeTranslator {
        async fn translate(&self, _text: &str, target: Language) -> Result<Translation, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_target.lock().unwrap() = Some(target);
            if self.fail {
                return Err(TranslateError::Api {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(Translation {
                text: "X".to_string(),
                detected_language: Some("en".to_string()),
            })
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Activity>>,
        tokens: Mutex<Vec<Option<String>>>,
        token_fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ActivityTransport for RecordingTransport {
        fn authenticate(&self, _auth_header: &str) -> Result<(), TransportError> {
            Ok(())
        }

        async fn connector_token(&self, _inbound: &Activity) -> Result<Option<String>, TransportError> {
            let n = self.token_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Some(format!("token-{}", n)))
        }

        async fn send(
            &self,
            _inbound: &Activity,
            outbound: &Activity,
            token: Option<&str>,
        ) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Api("down".to_string()));
            }
            self.sent.lock().unwrap().push(outbound.clone());
            self.tokens.lock().unwrap().push(token.map(str::to_string));
            Ok(())
        }
    }

    impl RecordingTransport {
        fn texts(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|a| a.text.clone())
                .collect()
        }
    }

    fn message(text: &str) -> Activity {
        serde_json::from_value(json!({
            "type": "message",
            "id": "act-1",
            "text": text,
            "from": { "id": "user-1" },
            "recipient": { "id": "bot-1" },
            "conversation": { "id": "conv-1" }
        }))
        .unwrap()
    }

    async fn run(bot: &TranslationBot, transport: &RecordingTransport, activity: &Activity) {
        let mut ctx = TurnContext::new(transport, activity);
        bot.on_turn(&mut ctx).await.unwrap();
        assert!(ctx.into_invoke_response().is_none());
    }

    #[tokio::test]
    async fn help_keywords_reply_with_help_and_skip_translation() {
        for input in ["/help", "help", "/translate help", "  HELP ", "/Translate Help"] {
            let translator = FakeTranslator::ok();
            let bot = TranslationBot::new(translator.clone());
            let transport = RecordingTransport::default();
            run(&bot, &transport, &message(input)).await;

            assert_eq!(transport.texts(), vec![HELP_TEXT.to_string()], "input {:?}", input);
            assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn help_must_match_exactly() {
        let translator = FakeTranslator::ok();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport::default();
        run(&bot, &transport, &message("help me")).await;
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_or_whitespace_text_prompts_for_input() {
        for input in ["", "   ", "\n\t"] {
            let translator = FakeTranslator::ok();
            let bot = TranslationBot::new(translator.clone());
            let transport = RecordingTransport::default();
            run(&bot, &transport, &message(input)).await;

            assert_eq!(transport.texts(), vec![EMPTY_TEXT_PROMPT.to_string()]);
            assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn missing_text_field_prompts_for_input() {
        let translator = FakeTranslator::ok();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport::default();
        let mut activity = message("");
        activity.text = None;
        run(&bot, &transport, &activity).await;
        assert_eq!(transport.texts(), vec![EMPTY_TEXT_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn english_text_gets_typing_then_translation_to_sinhala() {
        let translator = FakeTranslator::ok();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport::default();
        run(&bot, &transport, &message("Hello")).await;

        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].typ, ActivityType::Typing);
        assert_eq!(sent[1].typ, ActivityType::Message);
        assert_eq!(sent[1].text.as_deref(), Some("**Translated** (en → si):\nX"));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*translator.last_target.lock().unwrap(), Some(Language::Sinhala));
    }

    #[tokio::test]
    async fn sinhala_text_is_translated_to_english() {
        let translator = FakeTranslator::ok();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport::default();
        run(&bot, &transport, &message("ඔබට කොහොමද?")).await;
        assert_eq!(*translator.last_target.lock().unwrap(), Some(Language::English));
    }

    #[tokio::test]
    async fn translation_failure_becomes_chat_reply() {
        let translator = FakeTranslator::failing();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport::default();
        run(&bot, &transport, &message("Hello")).await;

        let texts = transport.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Sorry, translation failed:"));
        assert!(texts[0].contains("500"));
    }

    #[tokio::test]
    async fn members_added_welcomes_everyone_but_the_bot() {
        let translator = FakeTranslator::ok();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport::default();
        let activity: Activity = serde_json::from_value(json!({
            "type": "conversationUpdate",
            "recipient": { "id": "bot-1" },
            "conversation": { "id": "conv-1" },
            "membersAdded": [{ "id": "bot-1" }, { "id": "user-1" }, { "id": "user-2" }]
        }))
        .unwrap();
        run(&bot, &transport, &activity).await;

        assert_eq!(transport.texts(), vec![WELCOME_TEXT.to_string(); 2]);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_activity_types_send_nothing() {
        let translator = FakeTranslator::ok();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport::default();
        let activity: Activity =
            serde_json::from_value(json!({ "type": "messageReaction", "text": "Hello" })).unwrap();
        run(&bot, &transport, &activity).await;
        assert!(transport.sent.lock().unwrap().is_empty());
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expect_replies_buffers_into_invoke_response() {
        let bot = TranslationBot::new(FakeTranslator::ok());
        let transport = RecordingTransport::default();
        let mut activity = message("Hello");
        activity.delivery_mode = Some("expectReplies".to_string());

        let mut ctx = TurnContext::new(&transport, &activity);
        bot.on_turn(&mut ctx).await.unwrap();
        let response = ctx.into_invoke_response().unwrap();

        assert!(transport.sent.lock().unwrap().is_empty());
        assert_eq!(transport.token_fetches.load(Ordering::SeqCst), 0);
        assert_eq!(response.status, 200);
        let activities = response.body["activities"].as_array().unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0]["type"], "typing");
        assert_eq!(activities[1]["text"], "**Translated** (en → si):\nX");
        assert_eq!(activities[1]["replyToId"], "act-1");
    }

    #[tokio::test]
    async fn connector_token_is_fetched_once_per_turn() {
        let bot = TranslationBot::new(FakeTranslator::ok());
        let transport = RecordingTransport::default();
        run(&bot, &transport, &message("Hello")).await;

        assert_eq!(transport.token_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(
            *transport.tokens.lock().unwrap(),
            vec![Some("token-0".to_string()); 2]
        );

        // A new turn gets a new token.
        run(&bot, &transport, &message("Hello")).await;
        assert_eq!(transport.token_fetches.load(Ordering::SeqCst), 2);
        assert_eq!(transport.tokens.lock().unwrap()[2].as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn turn_without_replies_fetches_no_token() {
        let bot = TranslationBot::new(FakeTranslator::ok());
        let transport = RecordingTransport::default();
        let activity: Activity =
            serde_json::from_value(json!({ "type": "typing" })).unwrap();
        run(&bot, &transport, &activity).await;
        assert_eq!(transport.token_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let translator = FakeTranslator::ok();
        let bot = TranslationBot::new(translator.clone());
        let transport = RecordingTransport {
            fail: true,
            ..Default::default()
        };
        let activity = message("Hello");
        let mut ctx = TurnContext::new(&transport, &activity);
        assert!(bot.on_turn(&mut ctx).await.is_err());
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_detected_language_is_rendered() {
        let result = Ok(Translation {
            text: "Hello".to_string(),
            detected_language: None,
        });
        assert_eq!(
            format_translation(&result, Language::English),
            "**Translated** (unknown → en):\nHello"
        );
    }

    #[test]
    fn not_configured_message() {
        let result = Err(TranslateError::NotConfigured);
        assert_eq!(
            format_translation(&result, Language::Sinhala),
            "Sorry, translation failed: Translation service not configured"
        );
    }
}

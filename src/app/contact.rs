use time::OffsetDateTime;
use url::form_urlencoded;

use crate::app::validation::is_valid_email;

pub const CHAT_GREETING: &str = "Hello! Welcome to Binary Consultancy Services. 👋\n\nHow can we help you today? Feel free to ask about our research consultancy, capacity building, or any of our services.";

pub const CHAT_ACKNOWLEDGEMENT: &str = "Thank you for your message! 🙏\n\nWe've received your inquiry and will get back to you within 24 hours. In the meantime, you can also reach us at:\n\n📧 consultancy@binaryhub.pk\n📞 +92-21-3586-2100";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("Name is required")]
    MissingName,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Message cannot be empty")]
    EmptyMessage,
}

/// Percent-encodes a `mailto:` header value with `%20` for spaces.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn mailto_link(mailbox: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        mailbox,
        encode_component(subject),
        encode_component(body)
    )
}

/// The "chat with us" box on a service card.
#[derive(Debug, Clone, Default)]
pub struct ServiceInquiry {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub service_title: String,
}

impl ServiceInquiry {
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.name.trim().is_empty() {
            return Err(ContactError::MissingName);
        }
        if !is_valid_email(self.email.trim()) {
            return Err(ContactError::InvalidEmail);
        }
        if self.message.trim().is_empty() {
            return Err(ContactError::EmptyMessage);
        }
        Ok(())
    }

    pub fn mailto_link(&self, mailbox: &str) -> Result<String, ContactError> {
        self.validate()?;
        let subject = format!("Inquiry: {}", self.service_title);
        let body = format!(
            "Name: {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}\n\nService: {}",
            self.name.trim(),
            self.email.trim(),
            self.phone.trim(),
            self.message.trim(),
            self.service_title
        );
        Ok(mailto_link(mailbox, &subject, &body))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub sent_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct ChatContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Consultancy chat page. The first message needs contact details and hands
/// the transcript to the mail client; later messages only get the canned
/// acknowledgement.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    contact_collected: bool,
}

impl ChatTranscript {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            messages: vec![ChatMessage {
                sender: Sender::Bot,
                text: CHAT_GREETING.to_string(),
                sent_at: now,
            }],
            contact_collected: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn needs_contact(&self) -> bool {
        !self.contact_collected
    }

    /// Returns the `mailto:` link when this message is the one that carries
    /// the contact details.
    pub fn send(
        &mut self,
        text: &str,
        contact: &ChatContact,
        mailbox: &str,
        now: OffsetDateTime,
    ) -> Result<Option<String>, ContactError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ContactError::EmptyMessage);
        }
        if !self.contact_collected {
            if contact.name.trim().is_empty() {
                return Err(ContactError::MissingName);
            }
            if !is_valid_email(contact.email.trim()) {
                return Err(ContactError::InvalidEmail);
            }
        }

        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: text.to_string(),
            sent_at: now,
        });

        let link = if self.contact_collected {
            None
        } else {
            self.contact_collected = true;
            Some(self.transcript_link(contact, mailbox))
        };

        self.messages.push(ChatMessage {
            sender: Sender::Bot,
            text: CHAT_ACKNOWLEDGEMENT.to_string(),
            sent_at: now,
        });

        Ok(link)
    }

    fn transcript_link(&self, contact: &ChatContact, mailbox: &str) -> String {
        let phone = match contact.phone.trim() {
            "" => "Not provided",
            phone => phone,
        };
        let lines: Vec<String> = self
            .messages
            .iter()
            .map(|message| {
                let who = match message.sender {
                    Sender::User => "User",
                    Sender::Bot => "Bot",
                };
                format!("{}: {}", who, message.text)
            })
            .collect();
        let body = format!(
            "Name: {}\nEmail: {}\nPhone: {}\n\nMessages:\n{}",
            contact.name.trim(),
            contact.email.trim(),
            phone,
            lines.join("\n")
        );
        mailto_link(mailbox, "Inquiry from Consultancy Chat", &body)
    }
}

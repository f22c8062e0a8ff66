// src/services/templates.rs
//
// Templates são funções puras: (nome, fila, local, posição, espera) -> texto.
// Nenhuma lógica de provedor aqui: os provedores recebem o texto pronto.

pub struct EmailTemplate {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

// --- SMS ---

pub fn sms_queue_subscription(
    customer_name: &str,
    queue_name: &str,
    position: i32,
    estimated_wait: &str,
) -> String {
    format!(
        "Hi {customer_name}! You've joined the queue at {queue_name}. \
         Position: #{position}. Estimated wait: {estimated_wait}. \
         We'll notify you when it's your turn!"
    )
}

pub fn sms_next_in_line(customer_name: &str, queue_name: &str, location_name: &str) -> String {
    format!(
        "🔔 IT'S YOUR TURN, {customer_name}! Please proceed to {location_name} \
         at {queue_name}. Don't keep them waiting!"
    )
}

pub fn sms_almost_your_turn(
    customer_name: &str,
    queue_name: &str,
    position: i32,
    estimated_wait: &str,
) -> String {
    format!(
        "⏰ Almost your turn, {customer_name}! Position #{position} at {queue_name}. \
         Est. wait: {estimated_wait}. Please get ready!"
    )
}

// --- E-MAIL ---

pub fn email_queue_subscription(
    customer_name: &str,
    queue_name: &str,
    position: i32,
    estimated_wait: &str,
) -> EmailTemplate {
    let subject = format!("You've joined the queue at {queue_name}");
    let text_body = format!(
        "Hi {customer_name},\n\n\
         You've successfully joined the queue at {queue_name}.\n\n\
         Your current position: #{position}\n\
         Estimated wait time: {estimated_wait}\n\n\
         We'll notify you when it's almost your turn. Please make sure you're ready when called."
    );
    let html_body = format!(
        "<html><body>\
         <h1>You've Joined the Queue!</h1>\
         <p>Hi {customer_name},</p>\
         <p>You've successfully joined the queue at <strong>{queue_name}</strong>.</p>\
         <p><strong>Your Position:</strong> #{position}<br>\
         <strong>Estimated Wait Time:</strong> {estimated_wait}</p>\
         <p>We'll notify you when it's almost your turn. Please make sure you're ready when called.</p>\
         </body></html>"
    );
    EmailTemplate {
        subject,
        text_body,
        html_body,
    }
}

pub fn email_next_in_line(
    customer_name: &str,
    queue_name: &str,
    location_name: &str,
) -> EmailTemplate {
    let subject = format!("It's your turn at {queue_name}!");
    let text_body = format!(
        "Hi {customer_name},\n\n\
         IT'S YOUR TURN!\n\n\
         You're next in line at {queue_name}.\n\
         Please proceed to: {location_name}\n\n\
         If you're not ready, you may lose your spot in the queue."
    );
    let html_body = format!(
        "<html><body>\
         <h1>🔔 It's Your Turn!</h1>\
         <p>Hi {customer_name},</p>\
         <p><strong>YOU'RE NEXT IN LINE!</strong></p>\
         <p><strong>Location:</strong> {queue_name}<br>\
         <strong>Proceed to:</strong> {location_name}</p>\
         <p><strong>Important:</strong> If you're not ready, you may lose your spot in the queue.</p>\
         </body></html>"
    );
    EmailTemplate {
        subject,
        text_body,
        html_body,
    }
}

pub fn email_almost_your_turn(
    customer_name: &str,
    queue_name: &str,
    position: i32,
    estimated_wait: &str,
) -> EmailTemplate {
    let subject = format!("Almost your turn at {queue_name}");
    let text_body = format!(
        "Hi {customer_name},\n\n\
         You're almost up at {queue_name}!\n\n\
         Your current position: #{position}\n\
         Estimated wait time: {estimated_wait}\n\n\
         Please start making your way to the location so you're ready when called."
    );
    let html_body = format!(
        "<html><body>\
         <h1>⏰ Almost Your Turn!</h1>\
         <p>Hi {customer_name},</p>\
         <p>You're almost up at <strong>{queue_name}</strong>!</p>\
         <p><strong>Your Position:</strong> #{position}<br>\
         <strong>Estimated Wait Time:</strong> {estimated_wait}</p>\
         <p>Please start making your way to the location so you're ready when called.</p>\
         </body></html>"
    );
    EmailTemplate {
        subject,
        text_body,
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_de_entrada_na_fila_inclui_posicao_e_espera() {
        let msg = sms_queue_subscription("Maria", "Barbearia Central", 3, "20 minutes");
        assert!(msg.contains("Maria"));
        assert!(msg.contains("Barbearia Central"));
        assert!(msg.contains("#3"));
        assert!(msg.contains("20 minutes"));
    }

    #[test]
    fn sms_de_chamada_inclui_o_local() {
        let msg = sms_next_in_line("João", "Fila A", "Guichê 2");
        assert!(msg.contains("João"));
        assert!(msg.contains("Guichê 2"));
        assert!(msg.contains("IT'S YOUR TURN"));
    }

    #[test]
    fn email_de_chamada_tem_assunto_e_corpos() {
        let t = email_next_in_line("Ana", "Fila A", "Balcão 1");
        assert_eq!(t.subject, "It's your turn at Fila A!");
        assert!(t.text_body.contains("Balcão 1"));
        assert!(t.html_body.contains("<strong>Proceed to:</strong> Balcão 1"));
    }

    #[test]
    fn email_de_entrada_na_fila_inclui_posicao() {
        let t = email_queue_subscription("Ana", "Fila A", 1, "Unknown");
        assert!(t.text_body.contains("#1"));
        assert!(t.html_body.contains("Unknown"));
    }
}

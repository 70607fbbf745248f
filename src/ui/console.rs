use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::models::Message;
use crate::chat::{ChatEvent, ChatState, ChatViewModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Select(usize),
    New(String),
    Refresh,
    Help,
    Quit,
    Send(String),
    Invalid(String),
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "list" | "ls" => Command::List,
        "select" | "s" => match arg.parse::<usize>() {
            Ok(n) if n > 0 => Command::Select(n),
            _ => Command::Invalid(format!("usage: /select <number>, got {:?}", arg)),
        },
        "new" if !arg.is_empty() => Command::New(arg.to_string()),
        "new" => Command::Invalid("usage: /new <title>".into()),
        "refresh" | "r" => Command::Refresh,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command /{}", other)),
    }
}

pub fn format_message(msg: &Message) -> String {
    let tag = if msg.is_from_user() { "me>" } else { "ai>" };
    format!("{} {}", tag, msg.content)
}

pub fn format_conversations(state: &ChatState) -> String {
    if state.conversations.is_empty() {
        return "  (no conversations)".to_string();
    }
    let selected = state.selected_id();
    state
        .conversations
        .iter()
        .enumerate()
        .map(|(i, conv)| {
            let mark = if selected.is_some() && conv.id.as_deref() == selected { '*' } else { ' ' };
            format!(" {} {}. {}", mark, i + 1, conv.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Why `send_message` refused the current input.
pub fn send_rejection(state: &ChatState) -> &'static str {
    match &state.selected {
        None => "nothing selected, use /select <n> first",
        Some(conv) if conv.id.is_none() => "this conversation is not saved on the server yet, try /refresh",
        Some(_) => "nothing to send",
    }
}

fn print_thread(state: &ChatState) {
    let title = state.selected.as_ref().map(|c| c.title.as_str()).unwrap_or("NEW QUEST");
    println!("== {} ==", title);
    for msg in &state.messages {
        println!("{}", format_message(msg));
    }
}

fn print_help() {
    println!("/list  /select <n>  /new <title>  /refresh  /quit; anything else is sent");
}

fn render_event(state: &ChatState, event: &ChatEvent) {
    match event {
        ChatEvent::ConversationsLoaded { .. } => println!("{}", format_conversations(state)),
        ChatEvent::ConversationsFailed(e) => println!("! failed to load conversations: {} (try /refresh)", e),
        ChatEvent::MessagesLoaded { .. } => print_thread(state),
        ChatEvent::MessagesFailed { error, .. } => println!("! failed to load messages: {}", error),
        ChatEvent::MessageSent(msg) => {
            if state.messages.last() == Some(msg) {
                println!("{}", format_message(msg));
            }
        }
        ChatEvent::SendFailed(e) => println!("! not sent: {} (send again to retry)", e),
        ChatEvent::ConversationCreated(conv) => println!("+ started {}", conv.title),
        ChatEvent::CreateConversationFailed(e) => println!("! could not start conversation: {}", e),
        ChatEvent::Discarded(_) => {}
        ChatEvent::Abandoned(request) => println!("! request lost: {:?}", request),
    }
}

enum Flow {
    Continue,
    Quit,
}

fn handle_line(vm: &mut ChatViewModel, line: &str) -> Flow {
    match parse_command(line) {
        Command::Empty => {}
        Command::List => println!("{}", format_conversations(vm.state())),
        Command::Select(n) => match vm.state().conversations.get(n - 1).cloned() {
            Some(conv) => {
                println!("> {}", conv.title);
                vm.select_conversation(conv);
            }
            None => println!("! no conversation #{}", n),
        },
        Command::New(title) => vm.create_conversation(title),
        Command::Refresh => vm.load_conversations(),
        Command::Help => print_help(),
        Command::Quit => return Flow::Quit,
        Command::Send(text) => {
            vm.set_input(text);
            if !vm.send_message() {
                println!("! {}", send_rejection(vm.state()));
            }
        }
        Command::Invalid(msg) => println!("! {}", msg),
    }
    Flow::Continue
}

/// Drives the view-model from stdin until EOF or `/quit`.
pub async fn run(mut vm: ChatViewModel) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();
    loop {
        tokio::select! {
            Some(event) = vm.next_event(), if vm.has_pending() => {
                render_event(vm.state(), &event);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = handle_line(&mut vm, &line) {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Conversation;

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(parse_command("  hello there "), Command::Send("hello there".into()));
    }

    #[test]
    fn select_is_one_based() {
        assert_eq!(parse_command("/select 2"), Command::Select(2));
        assert!(matches!(parse_command("/select 0"), Command::Invalid(_)));
        assert!(matches!(parse_command("/select two"), Command::Invalid(_)));
    }

    #[test]
    fn new_needs_a_title() {
        assert_eq!(parse_command("/new Mystery Cave"), Command::New("Mystery Cave".into()));
        assert!(matches!(parse_command("/new"), Command::Invalid(_)));
    }

    #[test]
    fn unknown_and_empty_lines() {
        assert!(matches!(parse_command("/dance"), Command::Invalid(_)));
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(parse_command("/q"), Command::Quit);
    }

    #[test]
    fn list_marks_the_selection() {
        let a = Conversation::new("1", "Quest: Pixel Village");
        let b = Conversation::new("2", "Mystery Cave");
        let state = ChatState {
            conversations: vec![a, b.clone()],
            selected: Some(b),
            ..Default::default()
        };
        assert_eq!(
            format_conversations(&state),
            "   1. Quest: Pixel Village\n * 2. Mystery Cave"
        );
    }

    #[test]
    fn rejected_send_names_the_reason() {
        let mut state = ChatState::default();
        assert_eq!(send_rejection(&state), "nothing selected, use /select <n> first");

        state.selected = Some(Conversation {
            id: None,
            title: "Draft".into(),
        });
        assert_eq!(
            send_rejection(&state),
            "this conversation is not saved on the server yet, try /refresh"
        );

        state.selected = Some(Conversation::new("1", "A"));
        assert_eq!(send_rejection(&state), "nothing to send");
    }

    #[test]
    fn messages_are_tagged_by_sender() {
        let mine = Message {
            id: None,
            conversation_id: Some("1".into()),
            sender: "user".into(),
            content: "go north".into(),
        };
        let theirs = Message {
            sender: "assistant".into(),
            content: "You find a cave.".into(),
            ..mine.clone()
        };
        assert_eq!(format_message(&mine), "me> go north");
        assert_eq!(format_message(&theirs), "ai> You find a cave.");
    }
}

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use crate::api_client::models::{GENRES, Id, ProfileUpdate, User};
use crate::app::AppContext;
use crate::notify::{Toast, Variant};
use crate::store::FilterPatch;
use crate::views::{
    BookDetail, BookDetailView, BookForm, CatalogPage, CatalogView, EditBookView, LoginView,
    NewBookView, Outcome, Page, ProfileView, RegisterView, UserPage, UserView, display_name,
};

/// Terminal front end for the bookshelf site.
#[derive(Parser, Debug, Clone)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML config file.
    #[arg(short, long, env = "BOOKSHELF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the backend base URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and keep the session token.
    Login {
        username_or_email: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and log in.
    Register {
        username: String,
        email: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
    },
    Logout,
    /// Show the profile, or update it when a field is given.
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List books.
    Books {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        genre: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show a book with its comments, reviews and rating.
    Book { id: Id },
    /// Add a book.
    New {
        #[command(flatten)]
        fields: BookFields,
    },
    /// Edit one of your books.
    Edit {
        id: Id,
        #[command(flatten)]
        fields: BookFields,
    },
    /// Delete one of your books.
    Delete { id: Id },
    /// Comment on a book.
    Comment { book_id: Id, content: String },
    /// Review a book.
    Review {
        book_id: Id,
        #[arg(short, long, default_value_t = 5)]
        rating: u8,
        content: String,
    },
    /// Follow the author of a book, or unfollow when already following.
    Follow { book_id: Id },
    /// Show who a user follows and is followed by.
    User { user_id: Id },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct BookFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long = "cover")]
    pub cover_image_url: Option<String>,
}

impl BookFields {
    fn apply(self, form: &mut BookForm) {
        if let Some(v) = self.title {
            form.title = v;
        }
        if let Some(v) = self.author {
            form.author = v;
        }
        if let Some(v) = self.description {
            form.description = v;
        }
        if let Some(v) = self.genre {
            form.genre = v;
        }
        if let Some(v) = self.cover_image_url {
            form.cover_image_url = v;
        }
    }
}

pub async fn run(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    let res = dispatch(ctx, command).await;
    for toast in ctx.notifier.drain() {
        print_toast(&toast);
    }
    res
}

async fn dispatch(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login {
            username_or_email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let outcome = LoginView::new(ctx).submit(&username_or_email, &password).await;
            finish(outcome)?;
            if let Some(user) = ctx.session.user() {
                println!("Logged in as {}", user.username);
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let outcome = RegisterView::new(ctx)
                .submit(&username, &email, &password)
                .await;
            finish(outcome)?;
            println!("Welcome, {username}");
        }
        Command::Logout => {
            ctx.logout()?;
            println!("Logged out");
        }
        Command::Profile { username, email } => {
            let view = ProfileView::new(ctx);
            let patch = ProfileUpdate { username, email };
            if !patch.is_empty() {
                finish(view.update(patch).await)?;
            }
            print_user(&ready(view.load())?);
        }
        Command::Books {
            search,
            genre,
            page,
            limit,
        } => {
            ctx.filter.set_filter(FilterPatch {
                search,
                genre,
                page,
                limit,
            });
            print_catalog(&ready(CatalogView::new(ctx).load().await)?);
        }
        Command::Book { id } => {
            print_book(&ready(BookDetailView::new(ctx).load(&id).await)?);
        }
        Command::New { fields } => {
            let view = NewBookView::new(ctx);
            let mut form = ready(view.load())?;
            fields.apply(&mut form);
            finish(view.submit(&form).await)?;
        }
        Command::Edit { id, fields } => {
            let view = EditBookView::new(ctx);
            let mut form = ready(view.load(&id).await)?;
            fields.apply(&mut form);
            finish(view.submit(&id, &form).await)?;
        }
        Command::Delete { id } => {
            let view = EditBookView::new(ctx);
            // owner check
            ready(view.load(&id).await)?;
            finish(view.delete(&id).await)?;
        }
        Command::Comment { book_id, content } => {
            finish(BookDetailView::new(ctx).post_comment(&book_id, &content).await)?;
        }
        Command::Review {
            book_id,
            rating,
            content,
        } => {
            finish(
                BookDetailView::new(ctx)
                    .post_review(&book_id, &content, rating)
                    .await,
            )?;
        }
        Command::Follow { book_id } => {
            let view = BookDetailView::new(ctx);
            let detail = ready(view.load(&book_id).await)?;
            finish(view.toggle_follow(&detail.book).await)?;
        }
        Command::User { user_id } => {
            print_user_page(&ready(UserView::new(ctx).load(&user_id).await)?);
        }
    }
    Ok(())
}

fn ready<T>(page: Page<T>) -> anyhow::Result<T> {
    match page {
        Page::Ready(v) => Ok(v),
        Page::Loading => bail!("session is still loading"),
        Page::Redirect(route) => bail!("redirected to {route}; log in first if needed"),
        Page::NotFound => bail!("not found"),
        Page::Failed(msg) => bail!(msg),
    }
}

fn finish(outcome: Outcome) -> anyhow::Result<()> {
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Redirect(route) => {
            tracing::debug!(%route, "redirect");
            println!("-> {route}");
            Ok(())
        }
        Outcome::Invalid(msg) => bail!(msg),
        Outcome::Failed => bail!("request failed"),
    }
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(p) => Ok(p),
        None => prompt_password("Password: "),
    }
}

fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut password = String::new();
    io::stdin()
        .read_line(&mut password)
        .context("failed to read password")?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

fn print_toast(toast: &Toast) {
    let marker = match toast.variant {
        Variant::Success => "ok",
        Variant::Error => "!!",
        Variant::Default => "--",
    };
    match &toast.description {
        Some(desc) => eprintln!("[{marker}] {}: {desc}", toast.title),
        None => eprintln!("[{marker}] {}", toast.title),
    }
}

fn print_user(user: &User) {
    println!("{} (id {})", user.username, user.id);
    if let Some(email) = &user.email {
        println!("  {email}");
    }
}

fn print_catalog(page: &CatalogPage) {
    if page.genre_is_unfiltered() {
        println!("genres: {}", GENRES.join(", "));
    }
    if page.empty {
        println!("No books found.");
        return;
    }
    for book in &page.books {
        println!(
            "{:>6}  {} by {} [{}]",
            book.id.to_string(),
            book.title,
            book.author,
            book.genre.as_deref().unwrap_or("-")
        );
    }
    let p = &page.pagination;
    println!(
        "page {} of {} ({} books){}{}",
        p.page,
        p.page_count(),
        p.total,
        if p.has_prev() { ", prev" } else { "" },
        if p.has_next() { ", next" } else { "" },
    );
}

fn print_book(detail: &BookDetail) {
    let book = &detail.book;
    println!("{} by {}", book.title, book.author);
    if let Some(genre) = &book.genre {
        println!("Genre: {genre}");
    }
    if let Some(desc) = book.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n{desc}\n");
    }
    println!(
        "Added by {} | {} | rating {}",
        display_name(book.created_by.as_ref()),
        detail.follower_label(),
        detail.average_label()
    );
    if detail.is_own_book {
        println!("(your book)");
    } else if detail.can_follow {
        println!(
            "{}",
            if detail.is_following {
                "You follow this author"
            } else {
                "Not following this author"
            }
        );
    }

    println!("\nReviews ({}):", detail.reviews.len());
    for r in &detail.reviews {
        println!(
            "  {}/5 {}: {}",
            r.rating.get(),
            display_name(r.user.as_ref()),
            r.content
        );
    }
    println!("\nComments ({}):", detail.comments.len());
    for c in &detail.comments {
        let when = c
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("  {} {when}: {}", display_name(c.user.as_ref()), c.content);
    }
}

fn print_user_page(page: &UserPage) {
    println!("User {}", page.user_id);
    println!("Followers ({}):", page.followers.len());
    for u in &page.followers {
        println!("  {}", u.username);
    }
    println!("Following ({}):", page.following.len());
    for u in &page.following {
        println!("  {}", u.username);
    }
}

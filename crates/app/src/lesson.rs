use std::error::Error;

use course_core::model::{CourseId, ModuleId, Quiz, UserId};
use services::lessons::{LessonSession, LessonState, PresentedStep, StateKind};
use services::{AppServices, CourseError, LessonEngine, LessonError};

use crate::console::Console;

/// Walks a learner through one module interactively.
pub async fn run_lesson(
    services: &AppServices,
    console: &mut Console,
    user: UserId,
    course_id: &CourseId,
    module_id: Option<&ModuleId>,
) -> Result<(), Box<dyn Error>> {
    let courses = services.courses();
    let engine = services.lessons();

    let mut course = courses.load_course(course_id).await?;
    let module = match module_id {
        Some(id) => course
            .module(id)
            .cloned()
            .ok_or_else(|| CourseError::UnknownModule(id.to_string()))?,
        None => course
            .modules()
            .iter()
            .find(|m| !m.is_completed())
            .or_else(|| course.modules().first())
            .cloned()
            .ok_or("course has no modules")?,
    };

    println!("{} / {}", course.title(), module.title());
    let mut session = engine
        .start(module, course.id().clone(), course.title(), user)
        .await?;

    while !session.is_completed() {
        render(&session);

        if session.kind() == StateKind::AwaitingCheckpoint {
            if !answer_checkpoint(&engine, &mut session, console).await? {
                engine.abandon(&mut session);
                println!("Progress saved.");
                return Ok(());
            }
            continue;
        }

        let prompt = match session.kind() {
            StateKind::Failed => "[n]ext [r]etry [q]uit >",
            StateKind::Remedial => "[r]etake checkpoint [q]uit >",
            _ => "[n]ext [a]udio [q]uit >",
        };
        let Some(input) = console.ask(prompt).await? else {
            engine.abandon(&mut session);
            return Ok(());
        };

        let outcome = match (session.kind(), input.as_str()) {
            (_, "q") => {
                engine.abandon(&mut session);
                println!("Progress saved.");
                return Ok(());
            }
            (StateKind::Presenting | StateKind::Failed, "n" | "") => {
                engine.advance(&mut session).await
            }
            (StateKind::Failed, "r") => engine.retry(&mut session).await,
            (StateKind::Remedial, "r" | "") => engine.retake_checkpoint(&mut session).await,
            (StateKind::Presenting, "a") => {
                narrate(&engine, &mut session).await;
                Ok(())
            }
            _ => {
                println!("Unrecognized choice.");
                Ok(())
            }
        };
        if let Err(err) = outcome {
            println!("{err}");
        }
    }

    let module = engine.finish(session)?;
    courses.apply_finished_module(&mut course, module).await?;
    println!(
        "Module complete. Course progress: {}%",
        courses.course_progress_percent(&course)
    );
    let added = courses.extend_finished_course(&mut course).await;
    if added > 0 {
        println!("Course mastered. {added} advanced modules unlocked.");
    }
    Ok(())
}

/// Collects one answer per question and submits. `false` when the learner quits.
async fn answer_checkpoint(
    engine: &LessonEngine,
    session: &mut LessonSession,
    console: &mut Console,
) -> Result<bool, Box<dyn Error>> {
    let count = session.quiz().map_or(0, Quiz::len);
    for question in 0..count {
        loop {
            let Some(input) = console.ask(&format!("Q{} answer >", question + 1)).await? else {
                return Ok(false);
            };
            if input == "q" {
                return Ok(false);
            }
            let Some(option) = input.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                println!("Enter an option number.");
                continue;
            };
            match engine.select_answer(session, question, option) {
                Ok(()) => break,
                Err(err) => println!("{err}"),
            }
        }
    }

    let sheet = session.answer_sheet().cloned().unwrap_or_default();
    match engine.submit_checkpoint(session, &sheet).await {
        Ok(()) => Ok(true),
        Err(LessonError::Validation(err)) => {
            println!("{err}");
            Ok(true)
        }
        Err(err) => Err(err.into()),
    }
}

async fn narrate(engine: &LessonEngine, session: &mut LessonSession) {
    let Some(clip) = engine.lesson_audio(session).await else {
        println!("Narration is unavailable right now.");
        return;
    };
    let path = std::env::temp_dir().join(format!("narration-{}.mp3", session.current_step().id));
    match std::fs::write(&path, &clip.bytes) {
        Ok(()) => println!("Narration saved to {}", path.display()),
        Err(err) => println!("Could not save narration: {err}"),
    }
}

fn render(session: &LessonSession) {
    let total = session.module().step_count();
    match session.state() {
        LessonState::Presenting(step) => render_step(step, total),
        LessonState::Failed { step, reason, .. } => {
            render_step(step, total);
            println!("(content unavailable: {reason})");
        }
        LessonState::AwaitingCheckpoint { quiz, .. } => {
            println!();
            println!("Checkpoint: answer every question to continue.");
            for (i, q) in quiz.questions().iter().enumerate() {
                println!("Q{} {}", i + 1, q.text);
                for (j, option) in q.options.iter().enumerate() {
                    println!("   {}. {option}", j + 1);
                }
            }
        }
        LessonState::Remedial { outcome, text, .. } => {
            println!();
            println!(
                "You scored {}/{}. Mastery needs a perfect score.",
                outcome.score, outcome.total
            );
            println!("{text}");
        }
        _ => {}
    }
}

fn render_step(step: &PresentedStep, total: usize) {
    println!();
    let source = if step.offline { " (offline)" } else { "" };
    println!("Step {}/{}: {}{source}", step.index + 1, total, step.step.title);
    println!("{}", step.content.text);
    let video = step
        .content
        .video
        .embed_url()
        .unwrap_or_else(|| step.content.video.to_string());
    println!("Video: {video}");
}

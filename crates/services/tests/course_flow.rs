use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use course_core::catalog::initial_courses;
use course_core::model::{
    AudioClip, ChatRole, ChatTurn, CourseId, CourseOutline, CourseRecommendation, ModuleId,
    ModuleOutline, Quiz, Roadmap, StepOutline, UserId, VideoRef,
};
use services::content::ContentCollaborator;
use services::tutor_service::{EMPTY_REPLY, FALLBACK_REPLY, HISTORY_LIMIT};
use services::{ContentError, CourseError, CourseService, TutorService};
use storage::repository::Storage;

#[derive(Default)]
struct GeneratingContent {
    outline_calls: AtomicUsize,
    tutor_calls: AtomicUsize,
    offline: AtomicBool,
    silent: AtomicBool,
}

impl GeneratingContent {
    fn check(&self) -> Result<(), ContentError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ContentError::Disabled)
        } else {
            Ok(())
        }
    }
}

fn outline(modules: usize, steps: usize) -> CourseOutline {
    CourseOutline {
        modules: (0..modules)
            .map(|i| ModuleOutline {
                title: format!("Module {i}"),
                description: String::new(),
                steps: (0..steps)
                    .map(|j| StepOutline {
                        title: format!("Step {i}.{j}"),
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[async_trait]
impl ContentCollaborator for GeneratingContent {
    async fn step_lesson(&self, _: &str, _: &str, _: &str) -> Result<String, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn checkpoint_quiz(&self, _: &str, _: &[String]) -> Result<Quiz, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn remedial_text(&self, _: &str, _: &[String]) -> Result<String, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn find_video(&self, _: &str) -> Result<VideoRef, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn synthesize_audio(&self, _: &str) -> Result<AudioClip, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn summarize_course(&self, title: &str, _: &str) -> Result<String, ContentError> {
        self.check()?;
        Ok(format!("{title}, distilled."))
    }

    async fn recommend_course(
        &self,
        _: &str,
        catalog_titles: &[String],
    ) -> Result<CourseRecommendation, ContentError> {
        self.check()?;
        Ok(CourseRecommendation {
            course_title: catalog_titles[1].to_uppercase(),
            reason: "design first".into(),
        })
    }

    async fn career_roadmap(&self, _: &str) -> Result<Roadmap, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn course_outline(
        &self,
        _: &str,
        modules: usize,
        steps_per_module: usize,
    ) -> Result<CourseOutline, ContentError> {
        self.outline_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(outline(modules, steps_per_module))
    }

    async fn remedial_module(&self, topic: &str) -> Result<ModuleOutline, ContentError> {
        self.check()?;
        Ok(ModuleOutline {
            title: format!("Review: {topic}"),
            description: String::new(),
            steps: vec![StepOutline { title: "Again".into() }],
        })
    }

    async fn advanced_modules(&self, _: &str, count: usize) -> Result<CourseOutline, ContentError> {
        self.check()?;
        Ok(outline(count, 2))
    }

    async fn tutor_reply(&self, history: &[ChatTurn], message: &str) -> Result<String, ContentError> {
        self.tutor_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.silent.load(Ordering::SeqCst) {
            return Err(ContentError::EmptyResponse);
        }
        Ok(format!("{} turns before '{message}'", history.len()))
    }
}

fn service(content: Arc<GeneratingContent>, storage: &Storage) -> CourseService {
    CourseService::new(
        content,
        Arc::clone(&storage.syllabi),
        Arc::clone(&storage.bookmarks),
    )
}

#[tokio::test]
async fn syllabus_is_generated_once_then_served_from_storage() {
    let content = Arc::new(GeneratingContent::default());
    let storage = Storage::in_memory();
    let courses = service(content.clone(), &storage);

    let first = courses.load_course(&CourseId::new("c1")).await.unwrap();
    assert_eq!(first.modules().len(), 5);
    assert!(first.modules().iter().all(|m| m.step_count() == 3));
    assert_eq!(first.modules()[0].id(), &ModuleId::new("m-0"));

    let second = courses.load_course(&CourseId::new("c1")).await.unwrap();
    assert_eq!(second.modules(), first.modules());
    assert_eq!(content.outline_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generation_failure_falls_back_to_built_in_modules() {
    let content = Arc::new(GeneratingContent::default());
    content.offline.store(true, Ordering::SeqCst);
    let storage = Storage::in_memory();
    let courses = service(content, &storage);

    let course = courses.load_course(&CourseId::new("c1")).await.unwrap();
    assert_eq!(course.modules()[0].id(), &ModuleId::new("m1"));
    assert!(
        storage
            .syllabi
            .get_syllabus(&CourseId::new("c1"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn unknown_course_is_an_error() {
    let storage = Storage::in_memory();
    let courses = service(Arc::new(GeneratingContent::default()), &storage);
    let err = courses.load_course(&CourseId::new("c9")).await.unwrap_err();
    assert!(matches!(err, CourseError::UnknownCourse(id) if id == "c9"));
}

#[tokio::test]
async fn finished_module_is_written_back() {
    let content = Arc::new(GeneratingContent::default());
    content.offline.store(true, Ordering::SeqCst);
    let storage = Storage::in_memory();
    let courses = service(content, &storage);

    let mut course = courses.load_course(&CourseId::new("c1")).await.unwrap();
    let mut module = course.modules()[0].clone();
    module.mark_completed();
    courses
        .apply_finished_module(&mut course, module)
        .await
        .unwrap();
    assert_eq!(courses.course_progress_percent(&course), 50);

    let stored = storage
        .syllabi
        .get_syllabus(&CourseId::new("c1"))
        .await
        .unwrap()
        .unwrap();
    assert!(stored[0].is_completed());

    let stranger = initial_courses()[1].modules()[0].clone();
    assert!(matches!(
        courses.apply_finished_module(&mut course, stranger).await,
        Err(CourseError::UnknownModule(_))
    ));
}

#[tokio::test]
async fn finished_course_gains_advanced_modules() {
    let content = Arc::new(GeneratingContent::default());
    content.offline.store(true, Ordering::SeqCst);
    let storage = Storage::in_memory();
    let courses = service(content.clone(), &storage);

    let mut course = courses.load_course(&CourseId::new("c2")).await.unwrap();
    assert_eq!(courses.extend_finished_course(&mut course).await, 0);

    let mut module = course.modules()[0].clone();
    module.mark_completed();
    courses.apply_finished_module(&mut course, module).await.unwrap();

    content.offline.store(false, Ordering::SeqCst);
    assert_eq!(courses.extend_finished_course(&mut course).await, 2);
    assert_eq!(course.modules().len(), 3);
    assert!(course.modules()[1].id().as_str().starts_with("adv-0-"));
    assert_eq!(courses.course_progress_percent(&course), 33);
}

#[tokio::test]
async fn catalog_search_and_recommendation() {
    let storage = Storage::in_memory();
    let courses = service(Arc::new(GeneratingContent::default()), &storage);

    let hits = courses.search_catalog("PSYCHOLOGY");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), &CourseId::new("c2"));
    assert_eq!(courses.search_catalog("  ").len(), 2);

    let rec = courses.recommend("design apps").await.unwrap();
    assert_eq!(rec.course.id(), &CourseId::new("c2"));
    assert_eq!(rec.reason, "design first");
}

#[tokio::test]
async fn bookmarks_toggle_and_keep_save_order() {
    let storage = Storage::in_memory();
    let courses = service(Arc::new(GeneratingContent::default()), &storage);
    let user = UserId::new("u1");

    assert!(courses.bookmarked(&user).await.unwrap().is_empty());
    assert!(courses.toggle_bookmark(&user, &CourseId::new("c2")).await.unwrap());
    assert!(courses.toggle_bookmark(&user, &CourseId::new("c1")).await.unwrap());
    let saved: Vec<_> = courses
        .bookmarked(&user)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id().clone())
        .collect();
    assert_eq!(saved, vec![CourseId::new("c2"), CourseId::new("c1")]);

    assert!(!courses.toggle_bookmark(&user, &CourseId::new("c2")).await.unwrap());
    assert_eq!(
        storage.bookmarks.get_bookmarks(&user).await.unwrap(),
        vec![CourseId::new("c1")]
    );
    assert!(courses.bookmarked(&UserId::new("u2")).await.unwrap().is_empty());

    assert!(matches!(
        courses.toggle_bookmark(&user, &CourseId::new("c9")).await,
        Err(CourseError::UnknownCourse(id)) if id == "c9"
    ));
}

#[tokio::test]
async fn stale_bookmarks_are_skipped() {
    let storage = Storage::in_memory();
    let user = UserId::new("u1");
    storage
        .bookmarks
        .save_bookmarks(&user, &[CourseId::new("retired"), CourseId::new("c1")])
        .await
        .unwrap();
    let courses = service(Arc::new(GeneratingContent::default()), &storage);

    let saved = courses.bookmarked(&user).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id(), &CourseId::new("c1"));
}

#[tokio::test]
async fn summary_and_remedial_degrade_when_offline() {
    let content = Arc::new(GeneratingContent::default());
    let storage = Storage::in_memory();
    let courses = service(content.clone(), &storage);
    let course = initial_courses().remove(0);

    assert_eq!(
        courses.summary(&course).await,
        "Professional Web Development, distilled."
    );
    let remedial = courses.remedial_module("CSS").await.unwrap();
    assert!(remedial.is_remedial());
    assert_eq!(remedial.title(), "Review: CSS");

    content.offline.store(true, Ordering::SeqCst);
    assert_eq!(courses.summary(&course).await, course.description());
    let fallback = courses.remedial_module("CSS").await.unwrap();
    assert_eq!(fallback.title(), "Remedial Help");
    assert!(fallback.is_empty());
    assert!(fallback.id().as_str().starts_with("remedial-"));
    assert!(courses.roadmap("designer").await.is_err());
}

#[tokio::test]
async fn tutor_keeps_a_bounded_history() {
    let content = Arc::new(GeneratingContent::default());
    let tutor = TutorService::new(content.clone());

    assert_eq!(tutor.ask("hi").await, "0 turns before 'hi'");
    assert_eq!(tutor.ask("why?").await, "2 turns before 'why?'");

    for i in 0..20 {
        let _ = tutor.ask(&format!("q{i}")).await;
    }
    let history = tutor.history().await;
    assert_eq!(history.len(), HISTORY_LIMIT);
    assert_eq!(history[0].role, ChatRole::Learner);
    assert_eq!(history.last().unwrap().role, ChatRole::Tutor);

    content.offline.store(true, Ordering::SeqCst);
    assert_eq!(tutor.ask("still there?").await, FALLBACK_REPLY);
    assert_eq!(tutor.history().await.len(), HISTORY_LIMIT);

    tutor.clear().await;
    assert!(tutor.history().await.is_empty());
}

#[tokio::test]
async fn empty_tutor_reply_is_not_remembered() {
    let content = Arc::new(GeneratingContent::default());
    let tutor = TutorService::new(content.clone());

    assert_eq!(tutor.ask("hello").await, "0 turns before 'hello'");
    content.silent.store(true, Ordering::SeqCst);
    assert_eq!(tutor.ask("anyone?").await, EMPTY_REPLY);

    let history = tutor.history().await;
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|turn| turn.content != EMPTY_REPLY));
    assert_eq!(content.tutor_calls.load(Ordering::SeqCst), 2);
}
